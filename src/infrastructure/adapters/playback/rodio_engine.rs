//! Rodio Playback Engine - 本机扬声器输出
//!
//! rodio 的 OutputStream 不是 Send，由专用线程持有；
//! 每个缓冲使用独立的 Sink，线程轮询 Sink 是否播放完毕

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;

use crate::application::ports::{
    DeviceState, PlaybackEnginePort, PlaybackError, PlaybackHandle, PlaybackId,
};
use crate::domain::DecodedAudio;

/// 播放线程检查 Sink 结束的间隔
const POLL_INTERVAL: Duration = Duration::from_millis(20);

enum DeviceCommand {
    Play {
        id: PlaybackId,
        audio: DecodedAudio,
        done: oneshot::Sender<()>,
    },
    Stop(PlaybackId),
    Suspend,
    Resume,
    Shutdown,
}

struct Device {
    commands: mpsc::Sender<DeviceCommand>,
    state: DeviceState,
}

pub struct RodioPlaybackEngine {
    device: Mutex<Option<Device>>,
    next_id: AtomicU64,
}

impl RodioPlaybackEngine {
    pub fn new() -> Self {
        Self {
            device: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// 向播放线程发送命令；挂起的设备先恢复
    fn send(&self, command: DeviceCommand) -> Result<(), PlaybackError> {
        let mut device = self.device.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(device) = device.as_mut() else {
            return Err(PlaybackError::NotOpen);
        };
        let exited = |_| PlaybackError::PlaybackFailed("audio thread exited".to_string());

        if device.state == DeviceState::Suspended {
            device.commands.send(DeviceCommand::Resume).map_err(exited)?;
            device.state = DeviceState::Running;
            tracing::debug!("Audio output device resumed");
        }
        device.commands.send(command).map_err(exited)
    }
}

impl Default for RodioPlaybackEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 播放线程主循环
fn device_thread(
    commands: mpsc::Receiver<DeviceCommand>,
    ready: mpsc::SyncSender<Result<(), PlaybackError>>,
) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready.send(Err(PlaybackError::DeviceUnavailable(e.to_string())));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    let mut playing: HashMap<PlaybackId, (Sink, oneshot::Sender<()>)> = HashMap::new();

    loop {
        match commands.recv_timeout(POLL_INTERVAL) {
            Ok(DeviceCommand::Play { id, audio, done }) => match Sink::try_new(&handle) {
                Ok(sink) => {
                    sink.append(SamplesBuffer::new(
                        audio.channels(),
                        audio.sample_rate(),
                        audio.samples().to_vec(),
                    ));
                    playing.insert(id, (sink, done));
                }
                // 丢弃 done，调用方视为被停止
                Err(e) => tracing::error!(playback_id = %id, error = %e, "Failed to create sink"),
            },
            Ok(DeviceCommand::Stop(id)) => {
                if let Some((sink, _)) = playing.remove(&id) {
                    sink.stop();
                }
            }
            Ok(DeviceCommand::Suspend) => playing.values().for_each(|(sink, _)| sink.pause()),
            Ok(DeviceCommand::Resume) => playing.values().for_each(|(sink, _)| sink.play()),
            Ok(DeviceCommand::Shutdown) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                for (_, (sink, _)) in playing.drain() {
                    sink.stop();
                }
                break;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
        }

        let finished: Vec<PlaybackId> = playing
            .iter()
            .filter(|(_, (sink, _))| sink.empty())
            .map(|(id, _)| *id)
            .collect();
        for id in finished {
            if let Some((_, done)) = playing.remove(&id) {
                let _ = done.send(());
            }
        }
    }

    tracing::debug!("Audio device thread exited");
}

impl PlaybackEnginePort for RodioPlaybackEngine {
    fn open(&self) -> Result<(), PlaybackError> {
        let mut device = self.device.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = device.as_mut() {
            if existing.state == DeviceState::Suspended {
                existing
                    .commands
                    .send(DeviceCommand::Resume)
                    .map_err(|_| PlaybackError::DeviceUnavailable("audio thread exited".to_string()))?;
                existing.state = DeviceState::Running;
            }
            return Ok(());
        }

        let (commands, receiver) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        std::thread::Builder::new()
            .name("narrator-audio".to_string())
            .spawn(move || device_thread(receiver, ready_tx))
            .map_err(|e| PlaybackError::DeviceUnavailable(e.to_string()))?;

        ready_rx
            .recv()
            .map_err(|_| PlaybackError::DeviceUnavailable("audio thread exited".to_string()))??;

        tracing::info!("Audio output device opened");
        *device = Some(Device {
            commands,
            state: DeviceState::Running,
        });
        Ok(())
    }

    fn play_buffer(&self, audio: DecodedAudio) -> Result<PlaybackHandle, PlaybackError> {
        if audio.is_empty() {
            return Err(PlaybackError::PlaybackFailed("empty buffer".to_string()));
        }
        let id = PlaybackId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (done, ended) = oneshot::channel();
        self.send(DeviceCommand::Play { id, audio, done })?;
        Ok(PlaybackHandle::new(id, ended))
    }

    fn stop(&self, id: PlaybackId) {
        // 挂起状态下同样需要停止
        let device = self.device.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(device) = device.as_ref() {
            let _ = device.commands.send(DeviceCommand::Stop(id));
        }
    }

    fn suspend(&self) {
        let mut device = self.device.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(device) = device.as_mut() {
            if device.state == DeviceState::Running && device.commands.send(DeviceCommand::Suspend).is_ok() {
                device.state = DeviceState::Suspended;
            }
        }
    }

    fn close(&self) {
        let device = self
            .device
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(device) = device {
            let _ = device.commands.send(DeviceCommand::Shutdown);
            tracing::info!("Audio output device closed");
        }
    }

    fn state(&self) -> DeviceState {
        self.device
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|d| d.state)
            .unwrap_or(DeviceState::Closed)
    }
}
