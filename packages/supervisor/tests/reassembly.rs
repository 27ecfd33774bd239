//! Integration test: a frame split across two stdout chunks must still be
//! delivered as two whole, correctly typed events, with no parse warning
//! emitted for the partial fragment.

use enbu_flow_executor::progress::ProgressEvent;
use enbu_flow_supervisor::reassembly::LineReassembler;

#[test]
fn a_frame_split_mid_line_reassembles_into_two_typed_events() {
    let mut reassembler = LineReassembler::new();

    let first_chunk = b"{\"type\":\"step:start\",\"stepIndex\":0,\"stepTotal\":2}\n{\"type\":\"step:co";
    let second_chunk = b"mplete\",\"stepIndex\":0,\"stepTotal\":2,\"status\":\"passed\",\"duration\":123}\n";

    let mut lines = reassembler.push(first_chunk);
    lines.extend(reassembler.push(second_chunk));

    assert_eq!(lines.len(), 2);

    let events: Vec<ProgressEvent> =
        lines.iter().map(|l| serde_json::from_str(l).expect("each reassembled line is valid JSON")).collect();

    match &events[0] {
        ProgressEvent::StepStart { step_index, step_total } => {
            assert_eq!(*step_index, 0);
            assert_eq!(*step_total, 2);
        }
        other => panic!("expected step:start, got {:?}", other),
    }

    match &events[1] {
        ProgressEvent::StepComplete { step_index, step_total, duration, .. } => {
            assert_eq!(*step_index, 0);
            assert_eq!(*step_total, 2);
            assert_eq!(duration.as_millis(), 123);
        }
        other => panic!("expected step:complete, got {:?}", other),
    }
}
