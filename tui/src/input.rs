//! Terminal events to [`InputEvent`]s.

use crossterm::event::Event;
use crossterm::event::EventStream;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use futures::Stream;
use futures::StreamExt;
use futures::future;
use ktop_core::InputEvent;

use crate::key_hint::KeyBinding;
use crate::key_hint::ctrl;
use crate::key_hint::plain;

/// Every binding, in the order hints are shown.
pub(crate) const KEYMAP: &[(InputEvent, &[KeyBinding])] = &[
    (
        InputEvent::Toggle,
        &[plain(KeyCode::Enter), plain(KeyCode::Char(' '))],
    ),
    (
        InputEvent::Up,
        &[plain(KeyCode::Up), plain(KeyCode::Char('k'))],
    ),
    (
        InputEvent::Down,
        &[plain(KeyCode::Down), plain(KeyCode::Char('j'))],
    ),
    (InputEvent::PageUp, &[plain(KeyCode::PageUp)]),
    (InputEvent::PageDown, &[plain(KeyCode::PageDown)]),
    (
        InputEvent::Home,
        &[plain(KeyCode::Home), plain(KeyCode::Char('g'))],
    ),
    (
        InputEvent::End,
        &[plain(KeyCode::End), plain(KeyCode::Char('G'))],
    ),
    (InputEvent::CollapseAll, &[plain(KeyCode::Char('c'))]),
    (
        InputEvent::Quit,
        &[
            plain(KeyCode::Char('q')),
            plain(KeyCode::Esc),
            ctrl(KeyCode::Char('c')),
        ],
    ),
];

pub fn map_key(key: KeyEvent) -> Option<InputEvent> {
    KEYMAP
        .iter()
        .find(|(_, bindings)| bindings.iter().any(|binding| binding.is_press(key)))
        .map(|(event, _)| *event)
}

pub fn map_event(event: &Event) -> Option<InputEvent> {
    match event {
        Event::Key(key) => map_key(*key),
        Event::Resize(width, height) => Some(InputEvent::Resize(*width, *height)),
        _ => None,
    }
}

/// Dashboard input from the terminal. Ends at the first read error.
pub fn terminal_events() -> impl Stream<Item = InputEvent> + Unpin {
    Box::pin(
        EventStream::new()
            .take_while(|event| {
                if let Err(err) = event {
                    tracing::error!("terminal input failed: {err}");
                }
                future::ready(event.is_ok())
            })
            .filter_map(|event| future::ready(event.ok().as_ref().and_then(map_event))),
    )
}
