//! Outbound replies and the text shown to users

use crate::store::Habit;
use chrono::NaiveDate;
use std::fmt::Write;

/// Preset reminder times offered as buttons
pub const PRESET_TIMES: [[&str; 3]; 2] = [["09:00", "12:00", "15:00"], ["18:00", "21:00", "00:00"]];

/// A selectable option: visible label and the opaque token sent back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyOption {
    pub label: String,
    pub token: String,
}

impl ReplyOption {
    pub fn new(label: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            token: token.into(),
        }
    }
}

/// Text plus optional option rows for the gateway to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub options: Vec<Vec<ReplyOption>>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: vec![],
        }
    }

    pub fn with_row(mut self, row: Vec<ReplyOption>) -> Self {
        self.options.push(row);
        self
    }

    /// Tokens in display order
    #[allow(dead_code)] // Used in tests
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.options.iter().flatten().map(|o| o.token.as_str())
    }
}

// ============================================================================
// Fixed prompts
// ============================================================================

pub fn start_first() -> Reply {
    Reply::text("To get started, send the /start command")
}

pub fn admin_greeting() -> Reply {
    Reply::text("hi")
}

pub fn startup_notice(admin_chat_id: i64) -> Reply {
    Reply::text(format!("Bot started! Admin chat ID: {admin_chat_id}"))
}

pub fn main_menu(display_name: Option<&str>) -> Reply {
    let greeting = match display_name {
        Some(name) => format!("👋 Hi, {name}!"),
        None => "👋 Hi!".to_string(),
    };
    Reply::text(format!(
        "{greeting}\n\nI'll help you keep track of your habits.\n\nPick an action from the menu below:"
    ))
    .with_row(vec![ReplyOption::new("➕ Add habit", "add_habit")])
    .with_row(vec![ReplyOption::new("📋 My habits", "list_habits")])
    .with_row(vec![ReplyOption::new("✅ Mark as done", "mark_done")])
    .with_row(vec![ReplyOption::new("❌ Delete habit", "delete_habit")])
    .with_row(vec![ReplyOption::new("📊 Statistics", "stats")])
}

pub fn ask_habit_name() -> Reply {
    Reply::text("Send me the name of the new habit you want to track.")
}

pub fn ask_emoji(name: &str) -> Reply {
    Reply::text(format!(
        "Habit '{name}' added!\n\nSend me an emoji for your habit or press 'No emoji'"
    ))
    .with_row(vec![ReplyOption::new("❌ No emoji", "emoji_none")])
}

pub fn invalid_emoji() -> Reply {
    Reply::text("Please send a single emoji or press 'No emoji'")
}

pub fn empty_name() -> Reply {
    Reply::text("The habit name can't be empty. Send me a name for the habit.")
}

fn with_time_picker(reply: Reply) -> Reply {
    PRESET_TIMES.iter().fold(reply, |reply, row| {
        reply.with_row(
            row.iter()
                .map(|t| ReplyOption::new(*t, format!("time_{t}")))
                .collect(),
        )
    })
}

pub fn ask_time_after_emoji(emoji: &str) -> Reply {
    with_time_picker(Reply::text(format!(
        "Emoji {emoji} selected!\n\nNow pick a reminder time or send your own as HH:MM:"
    )))
}

pub fn ask_time_without_emoji() -> Reply {
    with_time_picker(Reply::text(
        "Alright, no emoji!\n\nNow pick a reminder time or send your own as HH:MM:",
    ))
}

pub fn invalid_time() -> Reply {
    Reply::text("Please send the time in HH:MM format\nFor example: 09:00")
}

pub fn habit_configured(habit: &Habit, time: &str) -> Reply {
    Reply::text(format!(
        "Habit {} successfully set up!\nReminder time: {time} 🎉",
        quoted(habit)
    ))
}

pub fn no_habits() -> Reply {
    Reply::text("You haven't added any habits yet.")
}

pub fn no_stats() -> Reply {
    Reply::text("No data for statistics yet.")
}

// ============================================================================
// Habit lists
// ============================================================================

/// `🔥 'Run'` or `'Run'`
fn quoted(habit: &Habit) -> String {
    match &habit.emoji {
        Some(emoji) => format!("{emoji} '{}'", habit.name),
        None => format!("'{}'", habit.name),
    }
}

fn status_mark(habit: &Habit, today: NaiveDate) -> &'static str {
    if habit.completed_on(today) {
        "✅"
    } else {
        "⏳"
    }
}

fn reminder_label(habit: &Habit) -> &str {
    habit
        .reminder_time
        .as_ref()
        .map_or("Not set", |t| t.as_str())
}

pub fn habit_list(habits: &[Habit], today: NaiveDate) -> Reply {
    let mut text = String::from("Your habits:\n\n");
    for habit in habits {
        let _ = writeln!(text, "{} {}", status_mark(habit, today), habit.display_name());
        let _ = writeln!(text, "   Reminder: {}", reminder_label(habit));
        let _ = writeln!(text, "   Streak: {} days\n", habit.streak);
    }
    Reply::text(text)
}

pub fn delete_picker(habits: &[Habit]) -> Reply {
    habits.iter().enumerate().fold(
        Reply::text("Pick the habit you want to delete:"),
        |reply, (i, habit)| {
            reply.with_row(vec![ReplyOption::new(
                format!("❌ {}", habit.display_name()),
                format!("del_{i}"),
            )])
        },
    )
}

pub fn done_picker(habits: &[Habit]) -> Reply {
    habits.iter().enumerate().fold(
        Reply::text("Pick the habit you completed today:"),
        |reply, (i, habit)| {
            reply.with_row(vec![ReplyOption::new(
                format!("✅ {}", habit.display_name()),
                format!("done_{i}"),
            )])
        },
    )
}

pub fn habit_deleted(habit: &Habit) -> Reply {
    Reply::text(format!("Habit {} deleted!", quoted(habit)))
}

pub fn already_done(habit: &Habit) -> Reply {
    Reply::text(format!(
        "Habit {} is already marked as done today!",
        quoted(habit)
    ))
}

pub fn marked_done(habit: &Habit, streak: u32) -> Reply {
    Reply::text(format!(
        "Great! Habit {} marked as done!\nCurrent streak: {streak} days 🔥",
        quoted(habit)
    ))
}

pub fn stats(habits: &[Habit], today: NaiveDate) -> Reply {
    let mut text = String::from("📊 Habit statistics:\n\n");
    let mut completed = 0;
    for habit in habits {
        if habit.completed_on(today) {
            completed += 1;
        }
        let _ = writeln!(text, "{} {}", status_mark(habit, today), habit.display_name());
        let _ = writeln!(text, "   Streak: {} days", habit.streak);
        let _ = writeln!(text, "   Reminder: {}", reminder_label(habit));
        if let Some(last) = habit.last_checked {
            let _ = writeln!(text, "   Last completed: {}", last.format("%d.%m.%Y"));
        }
        text.push('\n');
    }
    let _ = write!(
        text,
        "\nCompleted today: {completed} of {} habits",
        habits.len()
    );
    Reply::text(text)
}
