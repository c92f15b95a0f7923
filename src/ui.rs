//! Widget builders for the chat window.

use iced::widget::{button, checkbox, column, container, row, text, Column, Row, Space};
use iced::{alignment, font, Background, Border, Color, Element, Font, Length, Theme};

use crate::chat_log::{Body, ChatMessage, Origin};
use crate::formatter::{FormattedReply, Line, Priority, Segment, Status};
use crate::Message;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const BOLD: Font = Font {
    weight: font::Weight::Bold,
    ..Font::MONOSPACE
};

fn with_alpha(color: Color, alpha: f32) -> Color {
    Color {
        a: color.a * alpha,
        ..color
    }
}

fn priority_colors(priority: Priority) -> (Color, Color) {
    match priority {
        Priority::High => (Color::from_rgb8(0xff, 0x6b, 0x6b), Color::WHITE),
        Priority::Medium => (Color::from_rgb8(0xfe, 0xca, 0x57), Color::BLACK),
        Priority::Low => (Color::from_rgb8(0x1d, 0xd1, 0xa1), Color::WHITE),
    }
}

fn status_color(status: Status) -> Color {
    match status {
        Status::Completed => Color::from_rgb8(0x10, 0xac, 0x84),
        Status::InProgress => Color::from_rgb8(0xff, 0x9f, 0x43),
        Status::NotStarted => Color::from_rgb8(0x57, 0x65, 0x74),
    }
}

const DEADLINE: Color = Color::from_rgb(0.18, 0.525, 0.87);

fn segments<'a>(items: &'a [Segment], fg: Color, alpha: f32) -> Element<'a, Message> {
    let children = items.iter().map(|segment| -> Element<'a, Message> {
        match segment {
            Segment::Text(t) => text(t.as_str()).size(15).color(fg).into(),
            Segment::Priority(p) => {
                let (bg, label) = priority_colors(*p);
                container(text(p.as_str()).size(13).font(BOLD).color(with_alpha(label, alpha)))
                    .padding([0, 6])
                    .style(move |_theme: &Theme| container::Style {
                        background: Some(Background::Color(with_alpha(bg, alpha))),
                        border: Border {
                            radius: 4.0.into(),
                            ..Border::default()
                        },
                        ..container::Style::default()
                    })
                    .into()
            }
            Segment::Deadline(d) => text(d.as_str())
                .size(15)
                .font(BOLD)
                .color(with_alpha(DEADLINE, alpha))
                .into(),
            Segment::Status(s) => text(s.as_str())
                .size(15)
                .font(BOLD)
                .color(with_alpha(status_color(*s), alpha))
                .into(),
        }
    });
    Row::with_children(children)
        .align_y(alignment::Vertical::Center)
        .into()
}

fn formatted<'a>(id: usize, reply: &'a FormattedReply, fg: Color, alpha: f32) -> Element<'a, Message> {
    let muted = with_alpha(fg, 0.7);
    let mut task_index = 0;
    let mut lines = Column::new().spacing(4);

    for line in reply.lines() {
        lines = match line {
            Line::Blank => lines.push(Space::with_height(Length::Fixed(8.0))),
            Line::Text(items) => lines.push(segments(items, fg, alpha)),
            Line::Task(task) => {
                let index = task_index;
                task_index += 1;
                let color = if task.completed { muted } else { fg };
                let toggle = checkbox("", task.completed).on_toggle(move |checked| {
                    Message::TaskToggled {
                        message: id,
                        task: index,
                        checked,
                    }
                });
                lines.push(
                    row![text("•").color(color), toggle, segments(&task.segments, color, alpha)]
                        .spacing(6)
                        .align_y(alignment::Vertical::Center),
                )
            }
        };
    }
    lines.into()
}

fn bubble<'a>(
    origin: Origin,
    content: Element<'a, Message>,
    time: String,
    fg: Color,
    theme: &Theme,
    alpha: f32,
) -> Element<'a, Message> {
    let palette = theme.extended_palette();
    let (icon, background, align) = match origin {
        Origin::User => ("You", palette.primary.weak.color, alignment::Horizontal::Right),
        Origin::Bot => ("Bot", palette.background.weak.color, alignment::Horizontal::Left),
    };

    let body = column![
        row![text(icon).size(12).font(BOLD).color(fg), content].spacing(10),
        text(time).size(11).color(with_alpha(fg, 0.6)),
    ]
    .spacing(6);

    container(
        container(body)
            .padding(12)
            .max_width(640)
            .style(move |_theme: &Theme| container::Style {
                background: Some(Background::Color(with_alpha(background, alpha))),
                border: Border {
                    radius: 10.0.into(),
                    ..Border::default()
                },
                ..container::Style::default()
            }),
    )
    .width(Length::Fill)
    .align_x(align)
    .into()
}

pub fn message<'a>(msg: &'a ChatMessage, theme: &Theme, alpha: f32) -> Element<'a, Message> {
    let fg = with_alpha(theme.palette().text, alpha);
    let content = match &msg.body {
        Body::Plain => text(msg.text.as_str()).size(15).color(fg).into(),
        Body::Formatted(reply) => formatted(msg.id, reply, fg, alpha),
    };
    bubble(msg.origin, content, msg.time_label(), fg, theme, alpha)
}

pub fn loading<'a>(frame: usize, time: String, theme: &Theme) -> Element<'a, Message> {
    let fg = theme.palette().text;
    let content = row![
        text(SPINNER[frame % SPINNER.len()]).size(15).color(fg),
        text("...").size(15).color(fg),
    ]
    .spacing(6)
    .into();
    bubble(Origin::Bot, content, time, fg, theme, 1.0)
}

pub fn sidebar<'a, I>(entries: I) -> Element<'a, Message>
where
    I: Iterator<Item = &'a str>,
{
    let mut list = Column::new().spacing(6);
    for (index, label) in entries.enumerate() {
        list = list.push(
            button(text(label).size(13))
                .on_press(Message::HistorySelected(index))
                .width(Length::Fill)
                .style(button::secondary),
        );
    }

    container(column![text("Recent Tasks").size(16).font(BOLD), list].spacing(12))
        .padding(12)
        .width(Length::Fixed(240.0))
        .height(Length::Fill)
        .into()
}
