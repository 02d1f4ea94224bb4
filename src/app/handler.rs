//! Input handling — maps key events to state mutations.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::form::{self, FormItem};
use super::state::{AppState, Overlay, PromptPurpose, Tab};

/// Brightness change for PgUp/PgDn on a slider.
const SLIDER_PAGE: u8 = 16;
/// Log lines scrolled per PgUp/PgDn.
const LOG_PAGE: usize = 10;

/// Process a key event, dispatching on the open overlay first.
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    // Ctrl+c always quits, even with a popup open.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        state.should_quit = true;
        return;
    }

    match state.overlay {
        Overlay::None => handle_form_key(state, key),
        Overlay::Message { .. } => handle_message_key(state, key),
        Overlay::Prompt { .. } => handle_prompt_key(state, key),
    }
}

// ── Popups ──────────────────────────────────────────────────────

fn handle_message_key(state: &mut AppState, key: KeyEvent) {
    if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
        state.overlay = Overlay::None;
    }
}

fn handle_prompt_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => state.overlay = Overlay::None,
        KeyCode::Enter => state.confirm_prompt(),
        KeyCode::Backspace => {
            if let Overlay::Prompt { input, .. } = &mut state.overlay {
                input.pop();
            }
        }
        KeyCode::Char('u') if is_control(key) => {
            if let Overlay::Prompt { input, .. } = &mut state.overlay {
                input.clear();
            }
        }
        KeyCode::Char(ch) if !is_control(key) => {
            if let Overlay::Prompt { input, .. } = &mut state.overlay {
                input.push(ch);
            }
        }
        _ => {}
    }
}

/// Control chord.  AltGr arrives as CONTROL|ALT and still types a character.
fn is_control(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && !key.modifiers.contains(KeyModifiers::ALT)
}

// ── Tabs and forms ──────────────────────────────────────────────

fn handle_form_key(state: &mut AppState, key: KeyEvent) {
    let items = form::items(state.tab);

    match key.code {
        KeyCode::Char('q') => state.should_quit = true,
        KeyCode::Tab => switch_tab(state, state.tab.next()),
        KeyCode::BackTab => switch_tab(state, state.tab.prev()),
        KeyCode::Char(d @ '1'..='5') => {
            let idx = d as usize - '1' as usize;
            if let Some(&tab) = Tab::ALL.get(idx) {
                switch_tab(state, tab);
            }
        }
        KeyCode::Char('s') => state.save_ini(),
        KeyCode::Char('l') => state.open_prompt(PromptPurpose::LoadIni),
        KeyCode::Char('c') => {
            if let Some(log) = state.focused_log_mut() {
                log.clear();
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            if items.is_empty() {
                scroll_log(state, true, 1);
            } else {
                move_selection(state, items, false);
            }
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if items.is_empty() {
                scroll_log(state, false, 1);
            } else {
                move_selection(state, items, true);
            }
        }
        KeyCode::Left => adjust_or_switch(state, items, false),
        KeyCode::Right => adjust_or_switch(state, items, true),
        KeyCode::PageUp => page(state, items, true),
        KeyCode::PageDown => page(state, items, false),
        KeyCode::Home if items.is_empty() => {
            if let Some(log) = state.focused_log_mut() {
                log.scroll_up(usize::MAX / 2);
            }
        }
        KeyCode::End if items.is_empty() => scroll_log(state, false, usize::MAX),
        KeyCode::Enter | KeyCode::Char(' ') => activate(state, items),
        _ => {}
    }
}

/// Switch tabs, landing on the first selectable row when the stored one
/// is not valid.
fn switch_tab(state: &mut AppState, tab: Tab) {
    state.tab = tab;
    let items = form::items(tab);
    let sel = &mut state.selected[tab.index()];
    if !items.get(*sel).is_some_and(FormItem::selectable) {
        *sel = form::next_selectable(items, 0, true).unwrap_or(0);
    }
}

fn move_selection(state: &mut AppState, items: &[FormItem], forward: bool) {
    let cur = state.selected[state.tab.index()];
    let from = if forward {
        cur + 1
    } else if let Some(prev) = cur.checked_sub(1) {
        prev
    } else {
        return;
    };
    if let Some(next) = form::next_selectable(items, from, forward) {
        state.selected[state.tab.index()] = next;
    }
}

fn selected_item<'a>(state: &AppState, items: &'a [FormItem]) -> Option<&'a FormItem> {
    items
        .get(state.selected[state.tab.index()])
        .filter(|item| item.selectable())
}

/// ←/→ change the value of a radio group or slider; elsewhere they move
/// between tabs.
fn adjust_or_switch(state: &mut AppState, items: &[FormItem], forward: bool) {
    match selected_item(state, items) {
        Some(FormItem::Radio { step, .. }) => step(state, forward),
        Some(FormItem::Slider { get, set, .. }) => {
            let v = get(state);
            set(state, if forward { v.saturating_add(1) } else { v.saturating_sub(1) });
        }
        _ => {
            let tab = if forward { state.tab.next() } else { state.tab.prev() };
            switch_tab(state, tab);
        }
    }
}

fn page(state: &mut AppState, items: &[FormItem], up: bool) {
    if let Some(FormItem::Slider { get, set, .. }) = selected_item(state, items) {
        let v = get(state);
        set(
            state,
            if up {
                v.saturating_add(SLIDER_PAGE)
            } else {
                v.saturating_sub(SLIDER_PAGE)
            },
        );
        return;
    }
    scroll_log(state, up, LOG_PAGE);
}

fn scroll_log(state: &mut AppState, up: bool, n: usize) {
    if let Some(log) = state.focused_log_mut() {
        if up {
            log.scroll_up(n);
        } else {
            log.scroll_down(n);
        }
    }
}

fn activate(state: &mut AppState, items: &[FormItem]) {
    match selected_item(state, items) {
        Some(FormItem::Toggle { get, set, .. }) => {
            let current = get(state);
            set(state, !current);
        }
        Some(FormItem::Radio { step, .. }) => step(state, true),
        Some(FormItem::Button { run, .. }) => run(state),
        Some(FormItem::Slider { .. }) | Some(FormItem::Heading(_)) | None => {}
    }
}
