use super::crossterm_io::key_to_u8;
use super::key_buffer::KeyBuffer;
use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Requests from the user that are not keypad input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Reset,
}

/// Owns a thread that reads terminal events, records keypad presses
/// in a `KeyBuffer` and forwards everything else as a `Command`.
pub struct KeyManager {
    stop: Arc<Mutex<bool>>,
    key_buffer: Arc<KeyBuffer>,
    commands: Receiver<Command>,
    event_listener: Option<JoinHandle<()>>,
}

impl KeyManager {
    /// Start the event listener thread. A pressed key counts as held for `hold`.
    pub fn new(hold: Duration) -> KeyManager {
        let stop = Arc::new(Mutex::new(false));
        let key_buffer = Arc::new(KeyBuffer::new(hold));
        let (sender, commands) = mpsc::channel();
        let event_listener = event_listener(stop.clone(), key_buffer.clone(), sender);
        KeyManager {
            stop,
            key_buffer,
            commands,
            event_listener: Some(event_listener),
        }
    }

    pub fn is_held(&self, key: u8) -> bool {
        self.key_buffer.is_held(key)
    }

    pub fn release_all(&self) {
        self.key_buffer.release_all()
    }

    /// The oldest command not yet taken, if any.
    pub fn take_command(&self) -> Option<Command> {
        self.commands.try_recv().ok()
    }
}

impl Drop for KeyManager {
    fn drop(&mut self) {
        // Tell the event listener to stop, it notices within one poll interval
        *self.stop.lock().unwrap() = true;
        if let Some(handle) = self.event_listener.take() {
            if handle.join().is_err() {
                log::warn!("Event listener panicked");
            }
        }
    }
}

/// Starts a thread that listens for key events until told to stop.
fn event_listener(stop: Arc<Mutex<bool>>, key_buffer: Arc<KeyBuffer>, commands: Sender<Command>) -> JoinHandle<()> {
    thread::spawn(move || loop {
        if *stop.lock().unwrap() {
            break;
        }

        let event = match poll(POLL_INTERVAL).and_then(|ready| if ready { read().map(Some) } else { Ok(None) }) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(error) => {
                log::error!("Could not read terminal events: {}", error);
                let _ = commands.send(Command::Quit);
                break;
            }
        };
        log::trace!("Got event {:?}", event);

        if let Event::Key(key_event) = event {
            match command_for(key_event) {
                Some(command) => {
                    let _ = commands.send(command);
                }
                None => {
                    if let Some(key) = key_to_u8(key_event.code) {
                        key_buffer.press(key);
                    }
                }
            }
        }
    })
}

fn command_for(key_event: KeyEvent) -> Option<Command> {
    match key_event.code {
        KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
        KeyCode::F(1) | KeyCode::Backspace => Some(Command::Reset),
        _ => None,
    }
}
