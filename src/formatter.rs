//! Bot reply formatting.
//!
//! A reply is split into lines, each line is classified (blank, plain or a
//! bullet task), and then the inline rules run in order over the plain text
//! segments of every line. Rules never see segments an earlier rule already
//! produced, so annotations are not re-scanned.
//!
//! The structured [`FormattedReply`] is what the window draws. [`FormattedReply::to_markup`]
//! renders the same structure as HTML-like markup with plain text escaped.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::trace;

/// Leading marker of a task line.
pub const BULLET_MARKER: &str = "• ";

static PRIORITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Priority: (High|Medium|Low)").expect("valid priority regex"));
static DEADLINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Deadline: (.*)").expect("valid deadline regex"));
static STATUS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Status: (Not Started|In Progress|Completed)").expect("valid status regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "High" => Some(Priority::High),
            "Medium" => Some(Priority::Medium),
            "Low" => Some(Priority::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotStarted,
    InProgress,
    Completed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::NotStarted => "Not Started",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "Not Started" => Some(Status::NotStarted),
            "In Progress" => Some(Status::InProgress),
            "Completed" => Some(Status::Completed),
            _ => None,
        }
    }
}

/// An inline piece of a formatted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Priority(Priority),
    Deadline(String),
    Status(Status),
}

/// A checkable line taken from a bullet in the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub segments: Vec<Segment>,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Blank,
    Text(Vec<Segment>),
    Task(TaskItem),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattedReply {
    lines: Vec<Line>,
}

/// A rewrite applied to plain text segments.
pub trait InlineRule: Sync {
    fn name(&self) -> &'static str;

    /// Splits `text` into segments. Returning a single `Text` segment means
    /// the rule did not match.
    fn rewrite(&self, text: &str) -> Vec<Segment>;
}

pub struct PriorityRule;
pub struct DeadlineRule;
pub struct StatusRule;

impl InlineRule for PriorityRule {
    fn name(&self) -> &'static str {
        "priority"
    }

    fn rewrite(&self, text: &str) -> Vec<Segment> {
        split_with(&PRIORITY_RE, text, |caps| {
            Priority::parse(&caps[1]).map(|level| vec![
                Segment::Text("Priority: ".to_string()),
                Segment::Priority(level),
            ])
        })
    }
}

impl InlineRule for DeadlineRule {
    fn name(&self) -> &'static str {
        "deadline"
    }

    fn rewrite(&self, text: &str) -> Vec<Segment> {
        split_with(&DEADLINE_RE, text, |caps| {
            Some(vec![
                Segment::Text("Deadline: ".to_string()),
                Segment::Deadline(caps[1].to_string()),
            ])
        })
    }
}

impl InlineRule for StatusRule {
    fn name(&self) -> &'static str {
        "status"
    }

    fn rewrite(&self, text: &str) -> Vec<Segment> {
        split_with(&STATUS_RE, text, |caps| {
            Status::parse(&caps[1]).map(|status| vec![
                Segment::Text("Status: ".to_string()),
                Segment::Status(status),
            ])
        })
    }
}

/// Inline rules in the order they are applied.
pub static INLINE_RULES: [&dyn InlineRule; 3] = [&PriorityRule, &DeadlineRule, &StatusRule];

fn split_with<F>(re: &Regex, text: &str, mut replace: F) -> Vec<Segment>
where
    F: FnMut(&Captures) -> Option<Vec<Segment>>,
{
    let mut out = Vec::new();
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(replacement) = replace(&caps) else { continue };
        if whole.start() > last {
            out.push(Segment::Text(text[last..whole.start()].to_string()));
        }
        out.extend(replacement);
        last = whole.end();
    }
    if last < text.len() || out.is_empty() {
        out.push(Segment::Text(text[last..].to_string()));
    }
    merge_text(out)
}

fn merge_text(segments: Vec<Segment>) -> Vec<Segment> {
    let mut out: Vec<Segment> = Vec::with_capacity(segments.len());
    for segment in segments {
        match (out.last_mut(), segment) {
            (Some(Segment::Text(prev)), Segment::Text(next)) => prev.push_str(&next),
            (_, segment) => out.push(segment),
        }
    }
    out
}

fn apply_rules(text: &str, rules: &[&dyn InlineRule]) -> Vec<Segment> {
    let mut segments = vec![Segment::Text(text.to_string())];
    for rule in rules {
        trace!(rule = rule.name(), "applying inline rule");
        segments = segments
            .into_iter()
            .flat_map(|segment| match segment {
                Segment::Text(t) => rule.rewrite(&t),
                other => vec![other],
            })
            .collect();
    }
    merge_text(segments)
}

fn format_line(line: &str, rules: &[&dyn InlineRule]) -> Line {
    if line.trim().is_empty() {
        return Line::Blank;
    }
    match line.trim_start().strip_prefix(BULLET_MARKER) {
        Some(body) => Line::Task(TaskItem {
            segments: apply_rules(body, rules),
            completed: false,
        }),
        None => Line::Text(apply_rules(line, rules)),
    }
}

/// Formats a raw bot reply with the default rule set.
pub fn format_reply(text: &str) -> FormattedReply {
    format_with_rules(text, &INLINE_RULES)
}

/// Same as [`format_reply`], treating a missing reply as empty.
#[cfg(test)]
pub fn format_optional(text: Option<&str>) -> FormattedReply {
    text.map(format_reply).unwrap_or_default()
}

pub fn format_with_rules(text: &str, rules: &[&dyn InlineRule]) -> FormattedReply {
    if text.is_empty() {
        return FormattedReply::default();
    }
    FormattedReply {
        lines: text.split('\n').map(|line| format_line(line, rules)).collect(),
    }
}

impl FormattedReply {
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &TaskItem> {
        self.lines.iter().filter_map(|line| match line {
            Line::Task(task) => Some(task),
            _ => None,
        })
    }

    /// Sets the completion flag of the `index`-th task. Returns `false` if
    /// there is no such task.
    pub fn set_task_completed(&mut self, index: usize, completed: bool) -> bool {
        let task = self
            .lines
            .iter_mut()
            .filter_map(|line| match line {
                Line::Task(task) => Some(task),
                _ => None,
            })
            .nth(index);
        match task {
            Some(task) => {
                task.completed = completed;
                true
            }
            None => false,
        }
    }

    pub fn to_markup(&self) -> String {
        self.lines
            .iter()
            .map(render_line)
            .collect::<Vec<_>>()
            .join("<br>")
    }
}

fn render_line(line: &Line) -> String {
    match line {
        Line::Blank => String::new(),
        Line::Text(segments) => render_segments(segments),
        Line::Task(task) => {
            let class = if task.completed {
                "task-item completed-task"
            } else {
                "task-item"
            };
            let checked = if task.completed { " checked" } else { "" };
            format!(
                "{}<label class=\"{}\"><input type=\"checkbox\"{}> {}</label>",
                BULLET_MARKER,
                class,
                checked,
                render_segments(&task.segments)
            )
        }
    }
}

fn render_segments(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text(t) => out.push_str(&escape_html(t)),
            Segment::Priority(p) => {
                out.push_str(&format!("<span class=\"priority {0}\">{0}</span>", p.as_str()))
            }
            Segment::Deadline(d) => {
                out.push_str(&format!("<span class=\"deadline\">{}</span>", escape_html(d)))
            }
            Segment::Status(s) => {
                out.push_str(&format!("<span class=\"status {0}\">{0}</span>", s.as_str()))
            }
        }
    }
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Segment {
        Segment::Text(s.to_string())
    }

    #[test]
    fn test_empty_input() {
        assert!(format_reply("").is_empty());
        assert_eq!(format_reply("").to_markup(), "");
        assert_eq!(format_optional(None).to_markup(), "");
    }

    #[test]
    fn test_priority_levels_are_wrapped() {
        for level in ["High", "Medium", "Low"] {
            let markup = format_reply(&format!("Priority: {}", level)).to_markup();
            assert_eq!(
                markup,
                format!("Priority: <span class=\"priority {0}\">{0}</span>", level)
            );
        }
    }

    #[test]
    fn test_unknown_priority_is_left_alone() {
        let reply = format_reply("Priority: Urgent");
        assert_eq!(reply.lines(), &[Line::Text(vec![text("Priority: Urgent")])]);
    }

    #[test]
    fn test_status_values_are_wrapped() {
        for status in ["Not Started", "In Progress", "Completed"] {
            let markup = format_reply(&format!("Status: {}", status)).to_markup();
            assert!(markup.contains(&format!("<span class=\"status {0}\">{0}</span>", status)));
        }
    }

    #[test]
    fn test_deadline_runs_to_end_of_line() {
        let reply = format_reply("Deadline: 2024-05-01 09:00\nStatus: Completed");
        assert_eq!(
            reply.lines()[0],
            Line::Text(vec![
                text("Deadline: "),
                Segment::Deadline("2024-05-01 09:00".to_string()),
            ])
        );
        assert_eq!(
            reply.lines()[1],
            Line::Text(vec![text("Status: "), Segment::Status(Status::Completed)])
        );
    }

    #[test]
    fn test_bullets_become_tasks() {
        let reply = format_reply("Plan\n• Write report Priority: High\n• Email team");
        let tasks: Vec<_> = reply.tasks().collect();
        assert_eq!(tasks.len(), 2);
        assert_eq!(
            tasks[0].segments,
            vec![text("Write report Priority: "), Segment::Priority(Priority::High)]
        );
        assert!(!tasks[1].completed);

        let markup = reply.to_markup();
        assert!(markup.starts_with("Plan<br>• <label class=\"task-item\">"));
        assert!(markup.ends_with("<input type=\"checkbox\"> Email team</label>"));
    }

    #[test]
    fn test_mid_line_bullet_is_not_a_task() {
        let reply = format_reply("Groceries • weekly shop");
        assert_eq!(reply.tasks().count(), 0);
    }

    #[test]
    fn test_blank_lines_collapse() {
        let markup = format_reply("a\n   \nb").to_markup();
        assert_eq!(markup, "a<br><br>b");
    }

    #[test]
    fn test_markup_is_escaped() {
        let markup = format_reply("<script>alert('x')</script>").to_markup();
        assert_eq!(markup, "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;");
    }

    #[test]
    fn test_annotations_are_not_rescanned() {
        // The deadline text mentions a status but the status rule only sees plain text.
        let reply = format_reply("Deadline: after Status: Completed");
        assert_eq!(
            reply.lines()[0],
            Line::Text(vec![
                text("Deadline: "),
                Segment::Deadline("after Status: Completed".to_string()),
            ])
        );
    }

    #[test]
    fn test_rules_can_run_in_isolation() {
        let reply = format_with_rules("Priority: Low\nStatus: Completed", &[&StatusRule]);
        assert_eq!(reply.lines()[0], Line::Text(vec![text("Priority: Low")]));
        assert_eq!(INLINE_RULES.map(|r| r.name()), ["priority", "deadline", "status"]);
    }

    #[test]
    fn test_toggle_task_flag() {
        let mut reply = format_reply("• one\n• two");
        assert!(reply.set_task_completed(1, true));
        assert!(!reply.set_task_completed(2, true));
        let flags: Vec<_> = reply.tasks().map(|t| t.completed).collect();
        assert_eq!(flags, vec![false, true]);
        assert!(reply.to_markup().contains("completed-task"));
    }

    #[test]
    fn test_arbitrary_input_does_not_panic() {
        for input in ["•", "• ", "\n\n\n", "Deadline: ", "Priority: ", "ü•é\r\n• ✓", "Status:"] {
            let _ = format_reply(input).to_markup();
        }
    }
}
