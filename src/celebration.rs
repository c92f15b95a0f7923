//! Confetti shown when a task is checked off.

use std::time::Duration;

use iced::mouse;
use iced::widget::canvas::{self, Frame, Geometry};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};
use rand::Rng;

const PALETTE: [Color; 6] = [
    Color::from_rgb(1.0, 0.42, 0.42),
    Color::from_rgb(1.0, 0.79, 0.34),
    Color::from_rgb(0.11, 0.82, 0.63),
    Color::from_rgb(0.18, 0.53, 0.87),
    Color::from_rgb(0.64, 0.36, 0.93),
    Color::from_rgb(1.0, 0.62, 0.26),
];

/// Fraction of the run at the end during which particles fade out.
const FADE_OUT: f32 = 0.25;

#[derive(Debug, Clone, Copy)]
struct Particle {
    // Position and velocity are relative to the canvas size, per second.
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    size: f32,
    color: Color,
}

#[derive(Debug, Clone)]
pub struct Confetti {
    particles: Vec<Particle>,
    elapsed: Duration,
    duration: Duration,
}

impl Confetti {
    pub fn new(max: usize, duration: Duration) -> Self {
        Self::spawn(max, duration, &mut rand::rng())
    }

    #[cfg(test)]
    pub fn with_seed(max: usize, duration: Duration, seed: u64) -> Self {
        use rand::{rngs::StdRng, SeedableRng};
        Self::spawn(max, duration, &mut StdRng::seed_from_u64(seed))
    }

    fn spawn<R: Rng + ?Sized>(max: usize, duration: Duration, rng: &mut R) -> Self {
        let particles = (0..max)
            .map(|i| Particle {
                x: rng.random::<f32>(),
                y: rng.random_range(-0.3..0.0),
                vx: rng.random_range(-0.08..0.08),
                vy: rng.random_range(0.15..0.45),
                size: rng.random_range(4.0..9.0),
                color: PALETTE[i % PALETTE.len()],
            })
            .collect();
        Confetti {
            particles,
            elapsed: Duration::ZERO,
            duration,
        }
    }

    pub fn advance(&mut self, dt: Duration) {
        self.elapsed += dt;
        let secs = dt.as_secs_f32();
        for p in &mut self.particles {
            p.x += p.vx * secs;
            p.y += p.vy * secs;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    #[cfg(test)]
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    fn alpha(&self) -> f32 {
        if self.duration.is_zero() {
            return 0.0;
        }
        let progress = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        ((1.0 - progress) / FADE_OUT).clamp(0.0, 1.0)
    }
}

impl<Message> canvas::Program<Message> for Confetti {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let alpha = self.alpha();

        for p in &self.particles {
            if p.y < 0.0 || p.y > 1.0 {
                continue;
            }
            let top_left = Point::new(p.x * bounds.width, p.y * bounds.height);
            frame.fill_rectangle(
                top_left,
                Size::new(p.size, p.size * 0.6),
                Color { a: alpha, ..p.color },
            );
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawns_requested_particles() {
        let confetti = Confetti::with_seed(150, Duration::from_secs(3), 42);
        assert_eq!(confetti.particle_count(), 150);
        assert!(!confetti.is_finished());
    }

    #[test]
    fn test_finishes_after_duration() {
        let mut confetti = Confetti::with_seed(10, Duration::from_secs(3), 7);
        confetti.advance(Duration::from_millis(2900));
        assert!(!confetti.is_finished());
        confetti.advance(Duration::from_millis(100));
        assert!(confetti.is_finished());
        assert_eq!(confetti.alpha(), 0.0);
    }

    #[test]
    fn test_particles_fall() {
        let mut confetti = Confetti::with_seed(20, Duration::from_secs(3), 3);
        let before: Vec<f32> = confetti.particles.iter().map(|p| p.y).collect();
        confetti.advance(Duration::from_millis(500));
        for (p, y) in confetti.particles.iter().zip(before) {
            assert!(p.y > y);
        }
    }

    #[test]
    fn test_same_seed_same_layout() {
        let a = Confetti::with_seed(30, Duration::from_secs(3), 11);
        let b = Confetti::with_seed(30, Duration::from_secs(3), 11);
        for (p, q) in a.particles.iter().zip(&b.particles) {
            assert_eq!((p.x, p.y, p.vx, p.vy), (q.x, q.y, q.vx, q.vy));
            assert!((0.0..1.0).contains(&p.x));
            assert!((-0.3..0.0).contains(&p.y));
        }
    }

    #[test]
    fn test_unseeded_spawn() {
        let confetti = Confetti::new(150, Duration::from_secs(3));
        assert_eq!(confetti.particle_count(), 150);
    }
}
