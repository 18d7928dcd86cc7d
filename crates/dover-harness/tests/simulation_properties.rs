//! Property-based tests for the full runtime.
//!
//! Random sequences of user input, channel traffic and fetch releases are
//! played against the simulation. Invariants are checked on every render; the
//! oracle at the end checks the feed holds exactly the current room's history
//! followed by the live messages that arrived after it.

use dover_app::{AppEvent, KeyInput};
use dover_harness::{ScriptedLoader, Simulation};
use dover_proto::{AckId, ClientFrame, Room, RoomCode, ServerFrame, WireMessage};
use proptest::prelude::*;

const ROOMS: usize = 3;

#[derive(Debug, Clone)]
enum Step {
    Next,
    Prev,
    Pick(usize),
    Hold(usize),
    Release(usize),
    Live(u64),
    Reconnect,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => Just(Step::Next),
        1 => Just(Step::Prev),
        2 => (0..ROOMS).prop_map(Step::Pick),
        2 => (0..ROOMS).prop_map(Step::Hold),
        2 => (0..ROOMS).prop_map(Step::Release),
        3 => (1u64..1000).prop_map(Step::Live),
        1 => Just(Step::Reconnect),
    ]
}

fn code(i: usize) -> RoomCode {
    RoomCode::new(format!("r{i}"))
}

fn loader() -> ScriptedLoader {
    let rooms = (0..ROOMS).map(|i| Room::new(code(i), format!("Room {i}")));
    let mut loader = ScriptedLoader::new(rooms);
    for i in 0..ROOMS {
        loader = loader.with_history(code(i), vec![WireMessage::new(None, None, &format!("h{i}"))]);
    }
    loader
}

fn apply(sim: &Simulation, step: &Step) {
    let handle = sim.handle();
    match step {
        Step::Next => handle.press(KeyInput::Tab),
        Step::Prev => handle.press(KeyInput::Up),
        Step::Pick(i) => handle.inject_event(AppEvent::RoomPicked { code: code(*i) }),
        Step::Hold(i) => sim.loader().hold(code(*i)),
        Step::Release(i) => sim.loader().release(code(*i)),
        Step::Live(id) => handle.inject_frame(ServerFrame::MyResponse {
            message: WireMessage::new(Some("yc"), None, &format!("live {id}")),
            ack: Some(AckId(*id)),
        }),
        Step::Reconnect => {
            handle.inject_frame(ServerFrame::Disconnect);
            handle.inject_frame(ServerFrame::Connect);
        },
    }
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn feed_is_history_then_live(steps in prop::collection::vec(step_strategy(), 0..30)) {
        let rt = paused_runtime();
        let (feed, current, sent, violation) = rt.block_on(async {
            let mut sim = Simulation::new(loader());
            sim.start().await.unwrap();

            for step in &steps {
                apply(&sim, step);
                sim.settle().await.unwrap();
            }
            for i in 0..ROOMS {
                sim.loader().release(code(i));
            }
            sim.settle().await.unwrap();

            (
                sim.feed_texts(),
                sim.current_code().map(str::to_string),
                sim.handle().sent(),
                sim.handle().violation(),
            )
        });

        prop_assert_eq!(violation, None);

        let current = current.unwrap();
        let history = format!("h{}", current.trim_start_matches('r'));
        prop_assert_eq!(feed.first(), Some(&history));
        prop_assert!(feed[1..].iter().all(|line| line.starts_with("live ")));

        // Every live message shown was acknowledged.
        for line in &feed[1..] {
            let id: u64 = line.trim_start_matches("live ").parse().unwrap();
            prop_assert!(sent.contains(&ClientFrame::Ack { id: AckId(id) }), "ack {} never sent", id);
        }
    }
}
