use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use glam::Vec2;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::terrain::frame::{ShadedVertex, shade_into};
use crate::terrain::mesh::SurfacePoint;
use crate::terrain::shading::ShaderParameters;

const RESULT_CAPACITY: usize = 2;

pub enum TerrainCommand {
    Evaluate { t: f32, params: ShaderParameters },
    Stop,
}

pub struct TerrainFrame {
    pub t: f32,
    pub vertices: Vec<ShadedVertex>,
}

#[derive(Default)]
pub struct EngineStats {
    pub frames_evaluated: AtomicU64,
    /// Requests superseded by a newer one before the worker got to them.
    pub skipped_requests: AtomicU64,
    /// Finished frames evicted from the result queue unread.
    pub dropped_frames: AtomicU64,
    pub avg_eval_ms: Mutex<f32>,
}

/// Evaluates whole terrain frames on a worker thread.
pub struct TerrainEngine {
    tx_cmd: Sender<TerrainCommand>,
    rx_frame: Receiver<TerrainFrame>,
    stats: Arc<EngineStats>,
    thread_handle: Option<JoinHandle<()>>,
}

impl TerrainEngine {
    pub fn new(points: Vec<SurfacePoint>, uvs: Vec<Vec2>) -> Self {
        let (tx_cmd, rx_cmd) = channel::unbounded::<TerrainCommand>();
        let (tx_frame, rx_frame) = channel::bounded::<TerrainFrame>(RESULT_CAPACITY);
        let stats = Arc::new(EngineStats::default());
        let stats_clone = Arc::clone(&stats);
        let rx_evict = rx_frame.clone();

        let thread_handle = thread::spawn(move || {
            terrain_thread(rx_cmd, tx_frame, rx_evict, stats_clone, points, uvs);
        });

        Self {
            tx_cmd,
            rx_frame,
            stats,
            thread_handle: Some(thread_handle),
        }
    }

    pub fn evaluate(&self, t: f32, params: ShaderParameters) {
        let _ = self.tx_cmd.send(TerrainCommand::Evaluate { t, params });
    }

    /// Newest finished frame, discarding any older ones still queued.
    pub fn try_recv_latest(&self) -> Option<TerrainFrame> {
        let mut latest = None;
        while let Ok(frame) = self.rx_frame.try_recv() {
            latest = Some(frame);
        }
        latest
    }

    pub fn stats(&self) -> &Arc<EngineStats> {
        &self.stats
    }

    pub fn stop(&self) {
        let _ = self.tx_cmd.send(TerrainCommand::Stop);
    }
}

impl Drop for TerrainEngine {
    fn drop(&mut self) {
        let _ = self.tx_cmd.send(TerrainCommand::Stop);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

/// Blocks for the next request, then collapses everything queued behind it
/// into the newest one. `None` means stop.
fn next_request(rx_cmd: &Receiver<TerrainCommand>, stats: &EngineStats) -> Option<(f32, ShaderParameters)> {
    let mut latest = match rx_cmd.recv().ok()? {
        TerrainCommand::Evaluate { t, params } => (t, params),
        TerrainCommand::Stop => return None,
    };

    for cmd in rx_cmd.try_iter() {
        match cmd {
            TerrainCommand::Evaluate { t, params } => {
                stats.skipped_requests.fetch_add(1, Ordering::Relaxed);
                latest = (t, params);
            }
            TerrainCommand::Stop => return None,
        }
    }
    Some(latest)
}

fn terrain_thread(
    rx_cmd: Receiver<TerrainCommand>,
    tx_frame: Sender<TerrainFrame>,
    rx_evict: Receiver<TerrainFrame>,
    stats: Arc<EngineStats>,
    points: Vec<SurfacePoint>,
    uvs: Vec<Vec2>,
) {
    let mut eval_times = Vec::with_capacity(30);
    let mut spare: Option<Vec<ShadedVertex>> = None;

    while let Some((t, params)) = next_request(&rx_cmd, &stats) {

        let started = Instant::now();
        let mut vertices = spare.take().unwrap_or_default();
        shade_into(&points, &uvs, t, &params, &mut vertices);

        eval_times.push(started.elapsed().as_secs_f32() * 1000.0);
        if eval_times.len() > 30 {
            eval_times.remove(0);
        }
        *stats.avg_eval_ms.lock() = eval_times.iter().sum::<f32>() / eval_times.len() as f32;

        let mut frame = TerrainFrame { t, vertices };
        loop {
            match tx_frame.try_send(frame) {
                Ok(_) => break,
                Err(TrySendError::Full(rejected)) => {
                    // Make room by discarding the oldest unread frame.
                    if let Ok(stale) = rx_evict.try_recv() {
                        stats.dropped_frames.fetch_add(1, Ordering::Relaxed);
                        spare = Some(stale.vertices);
                    }
                    frame = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
        stats.frames_evaluated.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::mesh::PlaneGeometry;

    #[test]
    fn worker_matches_inline_evaluation() {
        let plane = PlaneGeometry::new(10.0, 10.0, 16, 16);
        let engine = TerrainEngine::new(plane.points.clone(), plane.uvs.clone());
        let params = ShaderParameters {
            distort_amount: 1.5,
            ..Default::default()
        };

        engine.evaluate(2.5, params);
        let frame = engine.rx_frame.recv().expect("worker produced a frame");
        assert_eq!(frame.t, 2.5);

        let mut expected = Vec::new();
        shade_into(&plane.points, &plane.uvs, 2.5, &params, &mut expected);
        assert_eq!(frame.vertices, expected);
    }

    fn wait_until_settled(engine: &TerrainEngine, requests: u64) {
        let stats = engine.stats();
        while stats.frames_evaluated.load(Ordering::Relaxed)
            + stats.skipped_requests.load(Ordering::Relaxed)
            < requests
        {
            thread::yield_now();
        }
    }

    #[test]
    fn burst_of_requests_delivers_the_newest() {
        let plane = PlaneGeometry::new(1.0, 1.0, 2, 2);
        let engine = TerrainEngine::new(plane.points.clone(), plane.uvs.clone());
        let params = ShaderParameters::default();

        for i in 0..5 {
            engine.evaluate(i as f32, params);
        }
        wait_until_settled(&engine, 5);

        let latest = engine.try_recv_latest().expect("frames were queued");
        assert_eq!(latest.t, 4.0);
        assert!(engine.try_recv_latest().is_none());
    }

    #[test]
    fn slow_worker_stays_one_request_behind_at_most() {
        let plane = PlaneGeometry::new(10.0, 10.0, 999, 999);
        let engine = TerrainEngine::new(plane.points.clone(), plane.uvs.clone());
        let params = ShaderParameters::default();

        let requests = 30;
        for i in 0..requests {
            engine.evaluate(i as f32, params);
            thread::sleep(std::time::Duration::from_millis(1));
        }
        wait_until_settled(&engine, requests);

        let stats = engine.stats();
        let evaluated = stats.frames_evaluated.load(Ordering::Relaxed);
        assert!(evaluated < requests, "every request was evaluated: {evaluated}");
        assert!(stats.skipped_requests.load(Ordering::Relaxed) > 0);

        let latest = engine.try_recv_latest().expect("a frame was produced");
        assert_eq!(latest.t, (requests - 1) as f32);
    }

    #[test]
    fn full_result_queue_evicts_oldest() {
        let plane = PlaneGeometry::new(1.0, 1.0, 2, 2);
        let engine = TerrainEngine::new(plane.points.clone(), plane.uvs.clone());
        let params = ShaderParameters::default();

        // One request at a time so none are coalesced and the queue overflows.
        for i in 0..4u64 {
            engine.evaluate(i as f32, params);
            while engine.stats().frames_evaluated.load(Ordering::Relaxed) <= i {
                thread::yield_now();
            }
        }

        assert_eq!(engine.stats().dropped_frames.load(Ordering::Relaxed), 2);
        let first = engine.rx_frame.try_recv().expect("queue holds two frames");
        let second = engine.rx_frame.try_recv().expect("queue holds two frames");
        assert_eq!((first.t, second.t), (2.0, 3.0));
    }
}
