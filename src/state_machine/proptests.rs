//! Property-based tests for the state machine
//!
//! Transitions are replayed against a plain `Vec<Habit>` that applies the
//! emitted mutations, the same way the runtime applies them to the store.

use super::*;
use crate::store::{Habit, ReminderTime};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
}

fn apply(habits: &mut Vec<Habit>, effects: &[Effect]) {
    for effect in effects {
        if let Effect::Mutate(mutation) = effect {
            mutation.clone().apply_to(habits).unwrap();
        }
    }
}

/// Drive one event through `transition` and apply its mutations
fn step(
    state: ConvState,
    habits: &mut Vec<Habit>,
    now: DateTime<Utc>,
    event: Event,
) -> Option<TransitionResult> {
    let context = ConvContext::new(now, habits.clone());
    let result = transition(&state, &context, event).ok()?;
    apply(habits, &result.effects);
    Some(result)
}

fn is_valid_state(state: ConvState, habits: &[Habit]) -> bool {
    match state.current_habit() {
        Some(index) => index < habits.len(),
        None => true,
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("add_habit".to_string()),
        Just("list_habits".to_string()),
        Just("delete_habit".to_string()),
        Just("mark_done".to_string()),
        Just("stats".to_string()),
        Just("emoji_none".to_string()),
        Just("time_09:00".to_string()),
        Just("time_25:00".to_string()),
        (0usize..5).prop_map(|i| format!("del_{i}")),
        (0usize..5).prop_map(|i| format!("done_{i}")),
    ]
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z ]{0,12}",
        Just("🔥".to_string()),
        Just("ab".to_string()),
        Just("07:30".to_string()),
        Just("24:00".to_string()),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_token().prop_map(Event::option),
        arb_text().prop_map(Event::text),
        Just(Event::command("start")),
    ]
}

/// Events paired with how many days pass before each one
fn arb_timeline() -> impl Strategy<Value = Vec<(i64, Event)>> {
    proptest::collection::vec((0i64..2, arb_event()), 0..40)
}

fn arb_habits() -> impl Strategy<Value = Vec<Habit>> {
    proptest::collection::vec("[a-z]{1,8}", 0..5).prop_map(|names| {
        names
            .into_iter()
            .map(|name| Habit::new(name, base_time()))
            .collect()
    })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // The flow's habit index always points at an existing habit
    #[test]
    fn prop_transitions_preserve_validity(timeline in arb_timeline()) {
        let mut state = ConvState::Idle;
        let mut habits = Vec::new();
        let mut now = base_time();

        for (days, event) in timeline {
            now += Duration::days(days);
            if let Some(result) = step(state, &mut habits, now, event) {
                state = result.new_state;
                prop_assert!(is_valid_state(state, &habits), "Invalid state {:?} for {} habits", state, habits.len());
            }
        }
    }

    // Streaks never decrease and grow by at most one per distinct day
    #[test]
    fn prop_streak_monotonic(timeline in arb_timeline()) {
        let mut state = ConvState::Idle;
        let mut habits: Vec<Habit> = Vec::new();
        let mut now = base_time();

        for (days, event) in timeline {
            now += Duration::days(days);
            let before = habits.clone();
            let is_delete = matches!(&event, Event::OptionSelected { token } if token.starts_with("del_"));
            if let Some(result) = step(state, &mut habits, now, event) {
                state = result.new_state;
                if !is_delete && before.len() <= habits.len() {
                    for (old, new) in before.iter().zip(&habits) {
                        prop_assert!(new.streak >= old.streak);
                        prop_assert!(new.streak <= old.streak + 1);
                        if new.streak > old.streak {
                            prop_assert_ne!(old.last_checked, Some(now.date_naive()));
                            prop_assert_eq!(new.last_checked, Some(now.date_naive()));
                        }
                    }
                }
            }
        }
    }

    // Completing twice on one day counts once
    #[test]
    fn prop_same_day_completion_idempotent(habits in arb_habits(), index in 0usize..5, hours in 0i64..12) {
        let mut habits = habits;
        let now = base_time();
        let token = format!("done_{index}");

        let first = step(ConvState::Idle, &mut habits, now, Event::option(token.clone())).unwrap();
        let after_first = habits.clone();
        let second = step(ConvState::Idle, &mut habits, now + Duration::hours(hours), Event::option(token)).unwrap();

        prop_assert_eq!(&habits, &after_first);
        prop_assert!(!second.effects.iter().any(Effect::is_mutation));
        if index < habits.len() {
            prop_assert_eq!(habits[index].streak, 1);
            prop_assert!(first.effects.iter().any(Effect::is_mutation));
            prop_assert_eq!(second.replies().count(), 1);
        } else {
            prop_assert!(first.effects.is_empty());
        }
    }

    // Deleting removes exactly one habit and shifts the rest down
    #[test]
    fn prop_delete_shifts_indices(habits in arb_habits(), index in 0usize..6) {
        let mut after = habits.clone();
        let result = step(ConvState::Idle, &mut after, base_time(), Event::option(format!("del_{index}"))).unwrap();

        if index < habits.len() {
            let mut expected = habits.clone();
            expected.remove(index);
            prop_assert_eq!(after, expected);
        } else {
            prop_assert_eq!(after, habits);
            prop_assert!(result.effects.is_empty());
        }
    }

    // "add N, set emoji or none, set time T" yields exactly that habit
    #[test]
    fn prop_add_flow_produces_habit(
        name in "[a-zA-Z][a-zA-Z ]{0,15}",
        use_emoji in any::<bool>(),
        hour in 0u32..24,
        minute in 0u32..60,
    ) {
        let mut habits = Vec::new();
        let now = base_time();
        let time = format!("{hour:02}:{minute:02}");

        let r = step(ConvState::Idle, &mut habits, now, Event::option("add_habit")).unwrap();
        let r = step(r.new_state, &mut habits, now, Event::text(name.clone())).unwrap();
        let emoji_event = if use_emoji { Event::text("🔥") } else { Event::option("emoji_none") };
        let r = step(r.new_state, &mut habits, now, emoji_event).unwrap();
        let r = step(r.new_state, &mut habits, now, Event::text(time.clone())).unwrap();

        prop_assert_eq!(r.new_state, ConvState::Idle);
        prop_assert_eq!(habits.len(), 1);
        let habit = &habits[0];
        prop_assert_eq!(&habit.name, name.trim());
        prop_assert_eq!(habit.emoji.as_ref().map(|e| e.as_str().to_string()), use_emoji.then(|| "🔥".to_string()));
        prop_assert_eq!(habit.reminder_time.clone(), Some(ReminderTime::parse(&time).unwrap()));
        prop_assert_eq!(habit.streak, 0);
        prop_assert_eq!(habit.last_checked, None);
    }

    // /start always lands in Idle without touching habits
    #[test]
    fn prop_start_always_idle(habits in arb_habits(), timeline in arb_timeline()) {
        let mut habits = habits;
        let mut state = ConvState::Idle;
        for (_, event) in timeline {
            if let Some(result) = step(state, &mut habits, base_time(), event) {
                state = result.new_state;
            }
        }
        let before = habits.clone();
        let result = step(state, &mut habits, base_time(), Event::command("start")).unwrap();
        prop_assert_eq!(result.new_state, ConvState::Idle);
        prop_assert_eq!(habits, before);
    }
}
