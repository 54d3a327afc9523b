//! Stream-level properties of segmentation and retention.

use proptest::prelude::*;
use sbb_core::{Segment, SegmentationMachine, Window};
use sbb_storage::RecordStore;
use sbb_testkit::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn segmentation_partitions_the_stream(
        config in config_strategy(),
        frames in frame_stream_strategy(0..80),
    ) {
        let pre = config.machine.pre_buffer_min;
        prop_assume!(frames.len() > pre);

        let mut machine = SegmentationMachine::new(config.machine.clone());
        machine.start(Segment::from_frames(frames[..pre].to_vec())).unwrap();

        let mut seen = Vec::new();
        for frame in frames[pre..].iter().cloned() {
            machine
                .advance(frame, |segment| {
                    seen.extend(segment.indices());
                    Ok(())
                })
                .unwrap();
        }
        if let Some(last) = machine.finish() {
            seen.extend(last.indices());
        }

        let expected: Vec<u64> = (0..frames.len() as u64).collect();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn recorder_respects_budget(
        config in config_strategy(),
        frames in frame_stream_strategy(0..80),
    ) {
        let budget = config.queue.budget_bytes();
        let (summary, queue) = record_in_memory(&config, frames);
        let stats = &summary.stats;

        prop_assert!(queue.is_empty() || queue.total_cost() < budget);
        prop_assert_eq!(queue.store().len(), queue.len());
        prop_assert_eq!(stats.segments_closed, stats.segments_admitted + stats.segments_rejected);
        prop_assert_eq!(stats.resident_segments(), summary.residents.len() as u64);
        if config.queue.fifo {
            prop_assert_eq!(stats.segments_rejected, 0);
        }
    }

    #[test]
    fn copy_then_split_partitions_a_segment(
        n in 0u64..30,
        k in 0usize..40,
    ) {
        let source = segment_with_values(0, &vec![0.5; n as usize]);

        let mut tail = Segment::new();
        tail.copy(&source, Window::last(k));
        let mut head = source.clone();
        head.split(Window::all_but_last(k));

        let rejoined: Vec<u64> = head.indices().chain(tail.indices()).collect();
        prop_assert_eq!(rejoined, (0..n).collect::<Vec<_>>());
        prop_assert_eq!(tail.size(), k.min(n as usize));
    }

    #[test]
    fn windows_resolve_in_bounds(window in window_strategy(40), len in 0usize..30) {
        let range = window.resolve(len);
        prop_assert!(range.start <= range.end);
        prop_assert!(range.end <= len);
    }
}
