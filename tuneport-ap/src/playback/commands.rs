//! Commands accepted by the playback actor

use crate::error::{Error, Result};
use tokio::sync::oneshot;
use tuneport_common::Track;

/// One request against the player
#[derive(Debug, Clone)]
pub enum Command {
    Play(Track),
    Pause,
    Resume,
    Stop,
    /// Seek to an absolute position in seconds
    Seek(u64),
    /// Requested volume; clamped to 0-100 by the actor
    SetVolume(i32),
    Release,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Play(_) => "play",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::Stop => "stop",
            Command::Seek(_) => "seek",
            Command::SetVolume(_) => "set_volume",
            Command::Release => "release",
        }
    }

    /// Commands that abandon a pending readiness wait
    pub fn interrupts_wait(&self) -> bool {
        matches!(self, Command::Play(_) | Command::Stop | Command::Release)
    }
}

/// A command together with the channel its caller waits on
#[derive(Debug)]
pub struct Envelope {
    pub command: Command,
    reply: oneshot::Sender<Result<()>>,
}

impl Envelope {
    pub fn new(command: Command) -> (Self, oneshot::Receiver<Result<()>>) {
        let (reply, rx) = oneshot::channel();
        (Self { command, reply }, rx)
    }

    /// Answer the caller. A caller that stopped waiting is not an error.
    pub fn reply(self, result: Result<()>) {
        let _ = self.reply.send(result);
    }

    pub fn reject_closed(self) {
        self.reply(Err(Error::ActorClosed));
    }
}
