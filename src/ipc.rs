//! Channel plumbing between the external messaging collaborator and the
//! control loop.
//!
//! Each inbound stream gets its own bounded channel and the loop drains them
//! between ticks, so a position/velocity/setpoint triple always lands as one
//! message and a tick can never observe a torn cross-axis update.

use crossbeam::channel::{bounded, Receiver, Sender};
use std::sync::Arc;

use crate::diagnostics::TickOutput;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Clone)]
pub struct ControlChannels {
    // Measurements from the state estimator.
    pub position_tx: Sender<Vec3>,
    pub position_rx: Arc<Receiver<Vec3>>,
    pub velocity_tx: Sender<Vec3>,
    pub velocity_rx: Arc<Receiver<Vec3>>,

    // Setpoints.
    pub position_ref_tx: Sender<Vec3>,
    pub position_ref_rx: Arc<Receiver<Vec3>>,
    pub velocity_ref_tx: Sender<Vec3>,
    pub velocity_ref_rx: Arc<Receiver<Vec3>>,

    // Reset signal, no payload.
    pub reset_tx: Sender<()>,
    pub reset_rx: Arc<Receiver<()>>,

    // Attitude/thrust command plus diagnostics, once per tick.
    pub output_tx: Sender<TickOutput>,
    pub output_rx: Arc<Receiver<TickOutput>>,
}

impl ControlChannels {
    pub fn new(buffer_size: usize) -> Self {
        let (position_tx, position_rx) = bounded(buffer_size);
        let (velocity_tx, velocity_rx) = bounded(buffer_size);
        let (position_ref_tx, position_ref_rx) = bounded(buffer_size);
        let (velocity_ref_tx, velocity_ref_rx) = bounded(buffer_size);
        let (reset_tx, reset_rx) = bounded(buffer_size);
        let (output_tx, output_rx) = bounded(buffer_size);

        Self {
            position_tx,
            position_rx: Arc::new(position_rx),
            velocity_tx,
            velocity_rx: Arc::new(velocity_rx),
            position_ref_tx,
            position_ref_rx: Arc::new(position_ref_rx),
            velocity_ref_tx,
            velocity_ref_rx: Arc::new(velocity_ref_rx),
            reset_tx,
            reset_rx: Arc::new(reset_rx),
            output_tx,
            output_rx: Arc::new(output_rx),
        }
    }
}
