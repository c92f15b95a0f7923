mod backend;
mod celebration;
mod chat_log;
mod config;
mod controller;
mod error;
mod formatter;
mod history;
mod time_format;
mod ui;
mod voice;

use iced::{
    alignment, time,
    widget::{
        button, canvas, column, container, row, scrollable, stack, text, text_input,
        text_input::Id, Column, Row,
    },
    window, Element, Font, Length, Subscription, Task, Theme,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use tracing::{debug, info};

use crate::backend::ChatClient;
use crate::celebration::Confetti;
use crate::chat_log::MessageId;
use crate::config::{CelebrationConfig, Config, QuickAction};
use crate::controller::{ChatController, WELCOME};
use crate::error::{ChatError, VoiceError};
use crate::voice::{SpeechRecognizer, VoiceState};

fn init_logging() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logging: {}", err))
}

fn main() -> anyhow::Result<()> {
    init_logging()?;
    let config = Config::load();
    info!(backend = %config.backend.base_url, "starting task-chat");

    let window_settings = window::Settings {
        size: iced::Size::new(config.window.width as f32, config.window.height as f32),
        min_size: Some(iced::Size::new(
            config.window.min_width as f32,
            config.window.min_height as f32,
        )),
        position: window::Position::Centered,
        ..Default::default()
    };

    iced::application("Task Assistant", App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(window_settings)
        .default_font(Font::MONOSPACE)
        .run_with(move || App::new(config))?;
    Ok(())
}

#[derive(Debug, Clone)]
enum Message {
    InputChanged(String),
    Submit,
    ResponseReceived(Result<String, ChatError>),
    QuickAction(usize),
    HistorySelected(usize),
    TaskToggled {
        message: MessageId,
        task: usize,
        checked: bool,
    },
    VoicePressed,
    VoiceFinished(Result<String, VoiceError>),
    Tick(Instant),
}

struct App {
    chat: ChatController,
    client: Arc<ChatClient>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    voice_lang: String,
    quick_actions: Vec<QuickAction>,
    celebration: CelebrationConfig,
    confetti: Option<Confetti>,
    loading_frame: usize,
    last_tick: Option<Instant>,
    input_id: Id,
    log_id: scrollable::Id,
}

impl App {
    fn new(config: Config) -> (Self, Task<Message>) {
        let recognizer = voice::recognizer_from_config(&config.voice);
        if recognizer.is_none() {
            debug!("no speech recognizer configured");
        }

        let mut chat = ChatController::new(config.history.max_items);
        chat.add_bot_message(WELCOME);

        let input_id = Id::unique();

        let app = App {
            chat,
            client: Arc::new(ChatClient::new(config.backend.base_url)),
            recognizer,
            voice_lang: config.voice.lang,
            quick_actions: config.quick_actions,
            celebration: config.celebration,
            confetti: None,
            loading_frame: 0,
            last_tick: None,
            input_id: input_id.clone(),
            log_id: scrollable::Id::unique(),
        };

        (app, text_input::focus(input_id))
    }

    fn scroll_to_latest(&self) -> Task<Message> {
        scrollable::snap_to(self.log_id.clone(), scrollable::RelativeOffset::END)
    }

    fn focus_input(&self) -> Task<Message> {
        text_input::focus(self.input_id.clone())
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::InputChanged(value) => {
                self.chat.set_input(value);
                Task::none()
            }
            Message::Submit => {
                let Some(outgoing) = self.chat.submit() else {
                    return Task::none();
                };
                let client = self.client.clone();

                Task::batch([
                    self.scroll_to_latest(),
                    Task::perform(
                        async move { client.send(&outgoing).await },
                        Message::ResponseReceived,
                    ),
                ])
            }
            Message::ResponseReceived(result) => {
                self.chat.complete(result);
                self.scroll_to_latest()
            }
            Message::QuickAction(index) => {
                if let Some(action) = self.quick_actions.get(index) {
                    self.chat.fill_command(&action.command);
                }
                self.focus_input()
            }
            Message::HistorySelected(index) => {
                self.chat.replay_history(index);
                self.focus_input()
            }
            Message::TaskToggled { message, task, checked } => {
                if self.chat.toggle_task(message, task, checked) {
                    // Restart the tick clock so an idle gap is not counted.
                    self.last_tick = None;
                    self.confetti = Some(Confetti::new(
                        self.celebration.max_particles,
                        self.celebration.duration(),
                    ));
                }
                Task::none()
            }
            Message::VoicePressed => {
                if self.chat.voice_state() == VoiceState::Listening {
                    return Task::none();
                }
                match &self.recognizer {
                    Some(recognizer) => {
                        self.chat.voice_started();
                        Task::perform(recognizer.listen(&self.voice_lang), Message::VoiceFinished)
                    }
                    None => {
                        self.chat.voice_unavailable();
                        self.scroll_to_latest()
                    }
                }
            }
            Message::VoiceFinished(result) => {
                if self.chat.voice_finished(result).is_some() {
                    self.scroll_to_latest()
                } else {
                    self.focus_input()
                }
            }
            Message::Tick(now) => {
                let dt = self
                    .last_tick
                    .map(|last| now.saturating_duration_since(last))
                    .unwrap_or_default();
                self.last_tick = Some(now);

                if self.chat.log().is_loading() {
                    self.loading_frame = self.loading_frame.wrapping_add(1);
                }
                if let Some(confetti) = &mut self.confetti {
                    confetti.advance(dt);
                    if confetti.is_finished() {
                        self.confetti = None;
                    }
                }
                Task::none()
            }
        }
    }

    fn is_animating(&self) -> bool {
        self.chat.log().is_loading()
            || self.confetti.is_some()
            || self.chat.log().any_fading(Instant::now())
    }

    fn subscription(&self) -> Subscription<Message> {
        if self.is_animating() {
            time::every(Duration::from_millis(30)).map(Message::Tick)
        } else {
            Subscription::none()
        }
    }

    fn view(&self) -> Element<Message> {
        let theme = self.theme();
        let now = Instant::now();

        let mut log = Column::new().spacing(12).padding(15);
        for msg in self.chat.log().messages() {
            log = log.push(ui::message(msg, &theme, msg.opacity(now)));
        }
        for i in 0..self.chat.log().loading_count() {
            log = log.push(ui::loading(
                self.loading_frame / 3 + i,
                time_format::format_time(&chrono::Local::now()),
                &theme,
            ));
        }
        let log = scrollable(log)
            .id(self.log_id.clone())
            .height(Length::Fill)
            .width(Length::Fill);

        let quick_actions = Row::with_children(self.quick_actions.iter().enumerate().map(
            |(index, action)| {
                button(text(action.label.as_str()).size(12))
                    .on_press(Message::QuickAction(index))
                    .padding([6, 12])
                    .style(button::primary)
                    .into()
            },
        ))
        .spacing(8);

        let listening = self.chat.voice_state() == VoiceState::Listening;
        let voice_button = button(text(if listening { "[rec]" } else { "[mic]" }).size(14))
            .on_press(Message::VoicePressed)
            .padding(12)
            .style(if listening { button::danger } else { button::success });

        let input = text_input("Type your message...", self.chat.input())
            .on_input(Message::InputChanged)
            .on_submit(Message::Submit)
            .padding(12)
            .size(16)
            .id(self.input_id.clone());

        let send = button(text("Send").size(14))
            .on_press(Message::Submit)
            .padding(12);

        let input_row = row![voice_button, input, send]
            .spacing(10)
            .align_y(alignment::Vertical::Center);

        let main = column![log, quick_actions, input_row]
            .spacing(10)
            .padding(10)
            .width(Length::Fill);

        let sidebar = ui::sidebar(self.chat.history().entries().map(|e| e.label.as_str()));

        let content: Element<Message> = container(row![sidebar, main])
            .width(Length::Fill)
            .height(Length::Fill)
            .into();

        match &self.confetti {
            Some(confetti) => stack![
                content,
                canvas(confetti).width(Length::Fill).height(Length::Fill),
            ]
            .into(),
            None => content,
        }
    }

    fn theme(&self) -> Theme {
        Theme::TokyoNight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(app: &mut App, checked: bool) {
        let _ = app.update(Message::TaskToggled {
            message: 0,
            task: 0,
            checked,
        });
    }

    #[test]
    fn test_confetti_survives_idle_gap() {
        let (mut app, _) = App::new(Config::default());
        let t0 = Instant::now();
        let _ = app.update(Message::Tick(t0));

        check(&mut app, true);
        let _ = app.update(Message::Tick(t0 + Duration::from_millis(10_030)));
        assert!(app.confetti.is_some());
    }

    #[test]
    fn test_confetti_lifecycle() {
        let (mut app, _) = App::new(Config::default());
        check(&mut app, true);
        assert!(app.confetti.is_some());
        assert!(app.is_animating());

        let t0 = Instant::now();
        let _ = app.update(Message::Tick(t0));
        let _ = app.update(Message::Tick(t0 + Duration::from_millis(30)));
        assert!(app.confetti.is_some());

        let end = t0 + app.celebration.duration() + Duration::from_millis(30);
        let _ = app.update(Message::Tick(end));
        assert!(app.confetti.is_none());
    }

    #[test]
    fn test_unchecking_never_celebrates() {
        let (mut app, _) = App::new(Config::default());
        check(&mut app, false);
        assert!(app.confetti.is_none());

        check(&mut app, true);
        app.confetti = None;
        check(&mut app, false);
        assert!(app.confetti.is_none());
    }
}
