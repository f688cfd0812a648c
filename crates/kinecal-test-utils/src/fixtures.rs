//! Reference positioners with known geometry.
//!
//! Fixture geometry is constant and valid, so construction panics instead of
//! returning errors.

use std::f64::consts::PI;

use nalgebra::{Unit, Vector3};

use kinecal_chain::{Joint, Positioner};
use kinecal_core::math::{rotation, translation};

/// `count` evenly spaced offsets from `start` to `end` inclusive.
pub fn linear_offsets(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

/// A prismatic slide carrying a turntable, with a probe off the table axis.
pub fn slide_and_turntable() -> Positioner {
    let slide = Joint::prismatic("Slide", Vector3::new(1.0, 0.02, 0.0), Vector3::zeros())
        .and_then(|j| j.with_limits(-200.0, 200.0))
        .expect("slide geometry is valid");
    let table = Joint::revolute("Turntable", Vector3::new(0.01, 0.0, 1.0), Vector3::new(0.0, 0.0, 30.0))
        .and_then(|j| j.with_limits(-PI, PI))
        .expect("turntable geometry is valid");
    Positioner::new("Slide + Turntable", vec![slide, table])
        .expect("fixture has joints")
        .with_tool(translation(&Vector3::new(45.0, 5.0, 12.0)))
}

/// X/Y translation stage with an omega rotation, mounted on a rotated base.
pub fn sample_stage() -> Positioner {
    let x = Joint::prismatic("X Stage", Vector3::new(1.0, 0.01, -0.005), Vector3::zeros())
        .and_then(|j| j.with_limits(-250.0, 250.0))
        .expect("x stage geometry is valid");
    let y = Joint::prismatic("Y Stage", Vector3::new(0.015, 1.0, 0.0), Vector3::new(0.0, 0.0, 15.0))
        .and_then(|j| j.with_limits(-250.0, 250.0))
        .expect("y stage geometry is valid");
    let omega = Joint::revolute("Omega Stage", Vector3::new(0.005, -0.01, 1.0), Vector3::new(3.0, -2.0, 40.0))
        .and_then(|j| j.with_limits(-PI, PI))
        .expect("omega stage geometry is valid");

    let tilt = Unit::new_normalize(Vector3::new(0.1, 0.2, 1.0));
    Positioner::new("Sample Stage", vec![x, y, omega])
        .expect("fixture has joints")
        .with_base(translation(&Vector3::new(120.0, -40.0, 15.0)) * rotation(&tilt, 0.35))
        .with_tool(translation(&Vector3::new(60.0, 25.0, 18.0)))
}

/// Two revolute joints with non-parallel axes, homed away from zero.
pub fn rotary_arm() -> Positioner {
    let shoulder = Joint::revolute("Shoulder", Vector3::z(), Vector3::zeros())
        .expect("shoulder geometry is valid")
        .with_home_offset(0.2);
    let elbow = Joint::revolute("Elbow", Vector3::new(0.0, 1.0, 0.1), Vector3::new(150.0, 0.0, 10.0))
        .expect("elbow geometry is valid")
        .with_home_offset(-0.1);
    Positioner::new("Rotary Arm", vec![shoulder, elbow])
        .expect("fixture has joints")
        .with_tool(translation(&Vector3::new(80.0, 0.0, 25.0)))
}
