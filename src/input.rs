use crate::mode::Mode;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Clone, Debug)]
pub(crate) struct InputEvent {
    pub(crate) key: KeyCode,
    pub(crate) mods: KeyModifiers,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Quit,
    Type(char),
    Erase,
    Submit,
    Restart,
}

pub(crate) fn collect_input_nonblocking(
    max_frame_time: Duration,
) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                out.push(InputEvent {
                    key: k.code,
                    mods: k.modifiers,
                });
                if out.len() >= 32 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_action(mode: Mode, ev: &InputEvent) -> Option<Action> {
    let ctrl = ev.mods.contains(KeyModifiers::CONTROL);
    match ev.key {
        KeyCode::Char('c') if ctrl => return Some(Action::Quit),
        KeyCode::Esc => return Some(Action::Quit),
        _ => {}
    }

    match mode {
        Mode::Input => match ev.key {
            KeyCode::Enter => Some(Action::Submit),
            KeyCode::Backspace => Some(Action::Erase),
            KeyCode::Char(c) if !ctrl && !c.is_control() => Some(Action::Type(c)),
            _ => None,
        },
        Mode::Transition => match ev.key {
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
            _ => None,
        },
        Mode::Display => match ev.key {
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Restart),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> InputEvent {
        InputEvent {
            key: code,
            mods: KeyModifiers::NONE,
        }
    }

    #[test]
    fn q_and_r_are_plain_text_while_typing() {
        assert_eq!(
            map_event_to_action(Mode::Input, &key(KeyCode::Char('q'))),
            Some(Action::Type('q'))
        );
        assert_eq!(
            map_event_to_action(Mode::Input, &key(KeyCode::Char('r'))),
            Some(Action::Type('r'))
        );
        assert_eq!(
            map_event_to_action(Mode::Input, &key(KeyCode::Char('雪'))),
            Some(Action::Type('雪'))
        );
    }

    #[test]
    fn quitting_works_everywhere() {
        let ctrl_c = InputEvent {
            key: KeyCode::Char('c'),
            mods: KeyModifiers::CONTROL,
        };
        for mode in [Mode::Input, Mode::Transition, Mode::Display] {
            assert_eq!(map_event_to_action(mode, &ctrl_c), Some(Action::Quit));
            assert_eq!(map_event_to_action(mode, &key(KeyCode::Esc)), Some(Action::Quit));
        }
        assert_eq!(
            map_event_to_action(Mode::Display, &key(KeyCode::Char('q'))),
            Some(Action::Quit)
        );
    }

    #[test]
    fn restart_only_from_display() {
        assert_eq!(map_event_to_action(Mode::Transition, &key(KeyCode::Char('r'))), None);
        assert_eq!(
            map_event_to_action(Mode::Display, &key(KeyCode::Char('r'))),
            Some(Action::Restart)
        );
        assert_eq!(map_event_to_action(Mode::Display, &key(KeyCode::Enter)), None);
    }
}
