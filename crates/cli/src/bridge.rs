use std::sync::mpsc;
use std::thread;

use engine::{Clock, Command, Engine, EngineErrorEvent, Event, Scheduler, TickSink};
use tracing::trace;

const COMMAND_CHANNEL_CAPACITY: usize = 32;
const EVENT_CHANNEL_CAPACITY: usize = 8;

/// Sender used by the front end to dispatch commands to the engine thread.
pub type EngineCommandSender = mpsc::SyncSender<Command>;

/// Receiver used by the front end to read events emitted by the engine thread.
pub type EngineEventReceiver = mpsc::Receiver<Event>;

/// Moves `engine` onto a worker thread and wires its timer ticks back into
/// the command queue.
///
/// Ticks are offered with `try_send`: when the queue is full the tick is
/// dropped, which is harmless because the playhead position is derived from
/// the clock. The worker stops once the event receiver is gone.
pub fn spawn_engine_bridge<C, S>(
    mut engine: Engine<C, S>,
) -> (EngineCommandSender, EngineEventReceiver)
where
    C: Clock + Send + 'static,
    S: Scheduler + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::sync_channel::<Command>(COMMAND_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::sync_channel::<Event>(EVENT_CHANNEL_CAPACITY);

    let tick_tx = command_tx.clone();
    engine.set_tick_sink(TickSink::new(move |generation| {
        if tick_tx.try_send(Command::Tick { generation }).is_err() {
            trace!(generation, "tick dropped");
        }
    }));

    thread::spawn(move || {
        while let Ok(command) = command_rx.recv() {
            match engine.handle_command(command) {
                Ok(events) => {
                    for event in events {
                        if event_tx.send(event).is_err() {
                            return;
                        }
                    }
                }
                Err(error) => {
                    if event_tx
                        .send(Event::Error(EngineErrorEvent::from_error(&error)))
                        .is_err()
                    {
                        return;
                    }
                }
            }
        }
    });

    (command_tx, event_rx)
}
