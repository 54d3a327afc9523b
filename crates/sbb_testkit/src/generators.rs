//! Property-based test generators using proptest.
//!
//! Provides strategies for frames, frame streams, windows and
//! configurations that satisfy the recorder's preconditions.

use proptest::prelude::*;
use sbb_core::{Config, Frame, ObjectId, QueueConfig, Window};

/// Strategy for object sets drawn from a small id space, so that frames
/// often share objects.
pub fn object_set_strategy() -> impl Strategy<Value = Vec<ObjectId>> {
    prop::collection::vec(0u64..8, 0..4)
}

/// Strategy for frame values in `[0, 1]`.
pub fn value_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), Just(1.0), 0.0f64..=1.0]
}

/// Strategy for a stream of `len` frames numbered from 0.
pub fn frame_stream_strategy(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<Frame>> {
    prop::collection::vec(
        (value_strategy(), 1.0f64..1e5, object_set_strategy()),
        len,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (value, cost, objects))| {
                Frame::new(i as u64, value, cost).with_objects(objects)
            })
            .collect()
    })
}

/// Strategy for windows with bounds in `[-limit, limit]`.
pub fn window_strategy(limit: isize) -> impl Strategy<Value = Window> {
    (
        prop::option::of(-limit..=limit),
        prop::option::of(-limit..=limit),
    )
        .prop_map(|(from, until)| Window::new(from, until))
}

/// Strategy for small valid configurations.
pub fn config_strategy() -> impl Strategy<Value = Config> {
    (
        0usize..5,
        1usize..8,
        1usize..6,
        0.0f64..1.0,
        0.0f64..1.0,
        1.0f64..1e6,
        1.0f64..1.2,
        any::<bool>(),
        0usize..3,
    )
        .prop_map(
            |(pre, extra, wait, similarity, value, budget, inflation, fifo, sigma)| {
                Config::new()
                    .pre_buffer_min(pre)
                    .major_buffer_max(pre + extra)
                    .wait_buffer_max(wait)
                    .similarity_threshold(similarity)
                    .value_threshold(value)
                    .filter_sigma(sigma)
                    .queue(
                        QueueConfig::default()
                            .with_budget_bytes(budget)
                            .with_inflation_factor(inflation)
                            .with_fifo(fifo),
                    )
            },
        )
}
