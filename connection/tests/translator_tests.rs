//! End-to-end tests of the notification translator, driven by datagram lines
//! as the server sends them.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chess::{format_fen, parse_fen, Side, Variant};
use connection::{
    Annotation, AnnotationEvent, AnnotationListener, ChessEventUpdate, Connection,
    ConnectionConfig, ConnectionError, ConnectionEvent, GameEvent, GameKind, GameList,
    GameListener, GameResult, InlineDispatcher, Listener, SeekEvent,
};
use cozy_chess::Board;
use datagram::{parse_datagram, DatagramKind, Notification, Outbound};
use tokio::sync::mpsc;

const START_7: &str = "15 7 A B 0 Blitz 1 5 0 5 0 1 1500 1600 {g1} {} {}";
const POSITION_7: &str = "101 7 {} 0";

struct Harness {
    conn: Connection,
    outbound: mpsc::UnboundedReceiver<Outbound>,
    events: Arc<Mutex<Vec<GameEvent>>>,
    listener: Arc<dyn GameListener>,
}

fn harness() -> Harness {
    let config = ConnectionConfig {
        username: Some("A".into()),
        ..ConnectionConfig::default()
    };
    let (mut conn, outbound) = Connection::new(config, Arc::new(InlineDispatcher));
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let listener: Arc<dyn GameListener> =
        Arc::new(move |e: &GameEvent| sink.lock().unwrap().push(e.clone()));
    conn.add_game_listener(listener.clone());
    Harness {
        conn,
        outbound,
        events,
        listener,
    }
}

impl Harness {
    fn try_feed(&mut self, line: &str) -> Result<(), ConnectionError> {
        self.conn.handle_datagram(&parse_datagram(line).unwrap())
    }

    fn feed(&mut self, line: &str) {
        self.try_feed(line).unwrap();
    }

    fn feed_at(&mut self, line: &str, now: Instant) {
        let notification = Notification::decode(&parse_datagram(line).unwrap()).unwrap();
        self.conn.handle_at(notification, now).unwrap();
    }

    fn take(&self) -> Vec<GameEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn sent(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = self.outbound.try_recv() {
            lines.push(line.to_line());
        }
        lines
    }

    /// Game 7 active with the standard start, events and outbound drained.
    fn with_game(mut self) -> Self {
        self.feed(START_7);
        self.feed(POSITION_7);
        self.take();
        self.sent();
        self
    }
}

fn names(events: &[GameEvent]) -> Vec<&'static str> {
    events.iter().map(GameEvent::name).collect()
}

fn fen_after(moves: &[&str]) -> String {
    let mut board = Board::default();
    for mv in moves {
        board.play(mv.parse().unwrap());
    }
    format_fen(&board)
}

mod game_start_tests {
    use super::*;

    #[test]
    fn stage_then_position_emits_one_start() {
        let mut h = harness();
        h.feed(START_7);
        assert!(h.conn.is_staged(7));
        assert!(h.take().is_empty());

        h.feed(POSITION_7);
        let events = h.take();
        assert_eq!(names(&events), vec!["game-started"]);
        match &events[0] {
            GameEvent::Started { game, position } => {
                assert_eq!(game.number(), 7);
                assert_eq!(game.kind(), GameKind::MyGame);
                assert_eq!(game.user_side(), Some(Side::White));
                assert_eq!(format_fen(position), format_fen(&Board::default()));
            }
            other => panic!("Unexpected event: {:?}", other),
        }
        assert!(!h.conn.is_staged(7));
    }

    #[test]
    fn declared_position_is_the_live_position() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        let mut h = harness();
        h.feed(START_7);
        h.feed(&format!("101 7 {{{}}} 0", fen));

        let expected = format_fen(&parse_fen(fen, Variant::Chess).unwrap());
        assert_eq!(format_fen(h.conn.position(7).unwrap()), expected);
    }

    #[test]
    fn five_minute_game_starts_with_stopped_full_clocks() {
        let mut h = harness();
        h.feed(START_7);
        h.feed(POSITION_7);

        assert_eq!(names(&h.take()), vec!["game-started"]);
        let record = h.conn.game(7).unwrap();
        assert_eq!(record.white().name, "A");
        assert_eq!(record.black().name, "B");
        assert_eq!(record.attributes().white_time.initial_millis, 300_000);
        for side in [Side::White, Side::Black] {
            let clock = h.conn.clock(7, side).unwrap();
            assert_eq!(clock.millis, 300_000);
            assert!(!clock.running);
        }
    }

    #[test]
    fn flip_while_staged_applies_at_promotion() {
        let mut h = harness();
        h.feed(START_7);
        h.feed("39 7 1");
        assert!(h.take().is_empty());
        h.feed(POSITION_7);
        assert!(h.conn.game(7).unwrap().is_flipped());
    }

    #[test]
    fn position_begin_on_active_game_resets_the_line() {
        let mut h = harness().with_game();
        h.feed("24 7 e4 e2e4");
        let fen = "4k3/8/8/8/8/8/8/4K3 w - - 0 1";
        h.feed(&format!("101 7 {{{}}} 0", fen));

        let events = h.take();
        assert_eq!(names(&events), vec!["move-made", "position-changed"]);
        let expected = format_fen(&parse_fen(fen, Variant::Chess).unwrap());
        assert_eq!(format_fen(h.conn.position(7).unwrap()), expected);
    }
}

mod unsupported_variant_tests {
    use super::*;

    #[test]
    fn unsupported_game_is_silently_ignored() {
        let mut h = harness();
        let notices = Arc::new(Mutex::new(Vec::new()));
        let sink = notices.clone();
        h.conn
            .add_listener::<ConnectionEvent>(Arc::new(move |e: &ConnectionEvent| {
                if let ConnectionEvent::Notice(text) = e {
                    sink.lock().unwrap().push(text.clone());
                }
            }));

        h.feed("18 8 X Y 23 Bughouse 0 2 0 2 0 1 0 0");
        for line in [
            "101 8 {} 0",
            "24 8 e4 e2e4",
            "56 8 W 1000 1",
            "62 8 W 10",
            "39 8 1",
            "23 8 1",
            "21 8 0 0 0 0 0 0 0 0",
            "60 8 X e4",
            "16 8 0 Res 1-0 {White wins}",
            "43 8 X",
            "19 8",
        ] {
            assert!(h.try_feed(line).is_ok(), "{}", line);
        }

        assert!(h.take().is_empty());
        assert!(h.conn.game(8).is_none());
        assert_eq!(notices.lock().unwrap().len(), 1);
    }
}

mod move_tests {
    use super::*;

    #[test]
    fn takeback_equals_replay_of_remaining_moves() {
        let mut h = harness().with_game();
        for line in [
            "24 7 e4 e2e4",
            "24 7 e5 e7e5",
            "24 7 Nf3 g1f3",
            "24 7 Nc6 b8c6",
        ] {
            h.feed(line);
        }
        h.feed("22 7 2");

        let events = h.take();
        assert_eq!(events.len(), 5);
        match &events[4] {
            GameEvent::Takeback {
                count, position, ..
            } => {
                assert_eq!(*count, 2);
                assert_eq!(format_fen(position), fen_after(&["e2e4", "e7e5"]));
            }
            other => panic!("Unexpected event: {:?}", other),
        }
        assert_eq!(
            format_fen(h.conn.position(7).unwrap()),
            fen_after(&["e2e4", "e7e5"])
        );
    }

    #[test]
    fn divergent_move_is_a_desync() {
        let mut h = harness().with_game();
        assert!(matches!(
            h.try_feed("24 7 e5 e2e5"),
            Err(ConnectionError::Diverged { game: 7, .. })
        ));
    }

    #[test]
    fn kriegspiel_moves_past_unseen_captures() {
        let mut h = harness();
        h.feed("15 9 A B 16 Blitz 1 5 0 5 0 1 1500 1600");
        h.feed("101 9 {} 0");
        h.take();

        for line in ["24 9 e4 e2e4", "24 9 ? ?", "24 9 exd5 e4d5"] {
            h.try_feed(line).unwrap();
        }
        let events = h.take();
        assert_eq!(names(&events), vec!["move-made", "move-made", "move-made"]);
        match &events[2] {
            GameEvent::MoveMade {
                entry, position, ..
            } => {
                assert_eq!(entry.smith, "e4d5");
                assert_eq!(position.side_to_move(), cozy_chess::Color::Black);
            }
            other => panic!("Unexpected event: {:?}", other),
        }
        assert_eq!(h.conn.game(9).unwrap().variant(), Variant::Kriegspiel);
    }

    #[test]
    fn isolated_board_without_moves_ends_immediately() {
        let mut h = harness();
        h.feed("40 9 C D 0 Blitz 0 5 0 5 0 0 0 0");
        h.feed("101 9 {} 0");

        let events = h.take();
        assert_eq!(names(&events), vec!["game-started", "game-ended"]);
        match &events[1] {
            GameEvent::Ended { result, .. } => assert_eq!(*result, GameResult::Unknown),
            other => panic!("Unexpected event: {:?}", other),
        }
        assert!(h.conn.game(9).is_none());
    }

    #[test]
    fn isolated_board_ends_after_expected_moves() {
        let mut h = harness();
        h.feed("40 9 C D 0 Blitz 0 5 0 5 0 0 0 0");
        h.feed("101 9 {} 2");
        h.feed("24 9 e4 e2e4");
        h.feed("24 9 e5 e7e5");

        let events = h.take();
        assert_eq!(
            names(&events),
            vec!["game-started", "move-made", "move-made", "game-ended"]
        );
        assert!(events[1..3]
            .iter()
            .all(|e| matches!(e, GameEvent::MoveMade { is_new: false, .. })));
    }

    #[test]
    fn own_game_does_not_end_when_caught_up() {
        let mut h = harness();
        h.feed(START_7);
        h.feed("101 7 {} 1");
        h.feed("24 7 e4 e2e4");
        h.feed("24 7 e5 e7e5");

        let events = h.take();
        assert_eq!(names(&events), vec!["game-started", "move-made", "move-made"]);
        assert!(matches!(events[1], GameEvent::MoveMade { is_new: false, .. }));
        assert!(matches!(events[2], GameEvent::MoveMade { is_new: true, .. }));
    }
}

mod replace_tests {
    use super::*;

    #[test]
    fn game_change_ends_then_restarts_and_replays() {
        let mut h = harness().with_game();
        h.feed("24 7 e4 e2e4");
        h.feed("24 7 e5 e7e5");
        let old = h.conn.game(7).unwrap();
        h.take();

        h.feed("99 7 A B 0 Blitz 1 5 0 5 0 1 1550 1600 {g1} {} {}");
        let events = h.take();
        assert_eq!(
            names(&events),
            vec![
                "game-ended",
                "game-started",
                "move-made",
                "move-made",
                "clock-adjusted",
                "clock-adjusted",
            ]
        );

        assert!(events[0].game().same_record(&old));
        let new = h.conn.game(7).unwrap();
        assert!(!new.same_record(&old));
        assert_eq!(new.white().rating, Some(1550));
        for event in &events[1..] {
            assert!(event.game().same_record(&new));
        }
        match (&events[2], &events[3]) {
            (
                GameEvent::MoveMade {
                    entry: first,
                    is_new: false,
                    ..
                },
                GameEvent::MoveMade {
                    entry: second,
                    position,
                    is_new: false,
                    ..
                },
            ) => {
                assert_eq!(first.smith, "e2e4");
                assert_eq!(second.smith, "e7e5");
                assert_eq!(format_fen(position), fen_after(&["e2e4", "e7e5"]));
            }
            other => panic!("Unexpected events: {:?}", other),
        }
        match &events[0] {
            GameEvent::Ended { result, .. } => assert_eq!(*result, GameResult::Unknown),
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[test]
    fn unchanged_relation_keeps_the_record() {
        let mut h = harness().with_game();
        h.feed("43 7 PW");
        assert!(h.take().is_empty());
    }

    #[test]
    fn relation_change_to_observer_replaces() {
        let mut h = harness().with_game();
        h.feed("39 7 1");
        h.take();
        h.feed("43 7 O");

        let events = h.take();
        assert_eq!(
            names(&events),
            vec![
                "game-ended",
                "game-started",
                "clock-adjusted",
                "clock-adjusted",
                "board-flipped",
            ]
        );
        let record = h.conn.game(7).unwrap();
        assert_eq!(record.kind(), GameKind::ObservedGame);
        assert_eq!(record.user_side(), None);
    }

    #[test]
    fn board_reset_moves_the_initial_position() {
        let fen = "4k3/8/8/8/8/8/8/4K3 w - - 0 1";
        let expected = format_fen(&parse_fen(fen, Variant::Chess).unwrap());
        let mut h = harness().with_game();
        let before = h.conn.game(7).unwrap();
        h.feed(&format!("101 7 {{{}}} 0", fen));
        assert_eq!(names(&h.take()), vec!["position-changed"]);
        assert_eq!(format_fen(&before.initial_position()), expected);

        h.feed("43 7 O");
        let events = h.take();
        match &events[1] {
            GameEvent::Started { position, .. } => assert_eq!(format_fen(position), expected),
            other => panic!("Unexpected event: {:?}", other),
        }
        let after = h.conn.game(7).unwrap();
        assert!(!after.same_record(&before));
        assert_eq!(format_fen(&after.initial_position()), expected);
    }

    #[test]
    fn simul_relation_finds_the_users_side() {
        let mut h = harness();
        h.feed("18 8 B A 0 Blitz 1 5 0 5 0 1 1500 1600");
        h.feed("101 8 {} 0");
        assert_eq!(h.conn.game(8).unwrap().user_side(), None);

        h.feed("43 8 PP");
        let record = h.conn.game(8).unwrap();
        assert_eq!(record.kind(), GameKind::MyGame);
        assert!(record.is_played());
        assert_eq!(record.user_side(), Some(Side::Black));
    }

    #[test]
    fn simul_relation_while_staged() {
        let mut h = harness();
        h.feed("18 8 A B 0 Blitz 1 5 0 5 0 1 1500 1600");
        h.feed("43 8 PP");
        h.feed("101 8 {} 0");
        assert_eq!(h.conn.game(8).unwrap().user_side(), Some(Side::White));
    }

    #[test]
    fn result_then_examine_carries_the_result() {
        let mut h = harness().with_game();
        h.feed("24 7 e4 e2e4");
        h.take();
        h.feed("16 7 1 Res 1-0 {Black resigns}");

        let events = h.take();
        assert_eq!(names(&events)[..3], ["game-ended", "game-started", "move-made"]);
        match &events[0] {
            GameEvent::Ended { result, .. } => assert_eq!(*result, GameResult::WhiteWins),
            other => panic!("Unexpected event: {:?}", other),
        }
        let examined = h.conn.game(7).unwrap();
        assert!(!examined.is_played());
        assert_eq!(examined.result(), GameResult::WhiteWins);
    }

    #[test]
    fn second_result_is_a_desync() {
        let mut h = harness().with_game();
        h.feed("16 7 0 Res 1-0 {Black resigns}");
        assert!(matches!(
            h.try_feed("16 7 0 Res 0-1 {White resigns}"),
            Err(ConnectionError::ResultAlreadySet { game: 7 })
        ));
    }

    #[test]
    fn game_end_reports_known_result() {
        let mut h = harness().with_game();
        h.feed("16 7 0 Agr 1/2-1/2 {Drawn by agreement}");
        h.feed("17 7");

        let events = h.take();
        assert_eq!(names(&events), vec!["game-ended"]);
        match &events[0] {
            GameEvent::Ended { result, .. } => assert_eq!(*result, GameResult::Draw),
            other => panic!("Unexpected event: {:?}", other),
        }
        assert!(h.conn.game(7).is_none());
    }
}

mod unechoed_tests {
    use super::*;

    #[test]
    fn echo_of_own_move_pops_one_entry() {
        let mut h = harness().with_game();
        h.conn.make_move(7, "e2e4".parse().unwrap()).unwrap();
        assert_eq!(h.sent(), vec!["e2e4"]);
        assert_eq!(h.conn.unechoed_moves(7), 1);

        h.feed("24 7 e4 e2e4");
        assert_eq!(h.conn.unechoed_moves(7), 0);
        assert_eq!(names(&h.take()), vec!["move-made"]);
    }

    #[test]
    fn rejection_of_head_clears_queue_and_reports_once() {
        let mut h = harness().with_game();
        h.conn.make_move(7, "e2e4".parse().unwrap()).unwrap();
        h.conn.make_move(7, "d2d4".parse().unwrap()).unwrap();
        assert_eq!(h.conn.unechoed_moves(7), 2);

        h.feed("42 7 e2e4 1");
        let events = h.take();
        assert_eq!(names(&events), vec!["illegal-move"]);
        assert_eq!(h.conn.unechoed_moves(7), 0);
    }

    #[test]
    fn foreign_confirmation_and_rejection_leave_queue_alone() {
        let mut h = harness().with_game();
        h.conn.make_move(7, "d2d4".parse().unwrap()).unwrap();

        h.feed("42 7 c2c4 1");
        assert!(h.take().is_empty());
        assert_eq!(h.conn.unechoed_moves(7), 1);

        h.feed("24 7 c4 c2c4");
        assert_eq!(names(&h.take()), vec!["move-made"]);
        assert_eq!(h.conn.unechoed_moves(7), 1);
    }

    #[test]
    fn relation_nothing_ends_game_and_drops_queue() {
        let mut h = harness().with_game();
        h.conn.make_move(7, "e2e4".parse().unwrap()).unwrap();
        h.feed("43 7 X");

        assert_eq!(names(&h.take()), vec!["game-ended"]);
        assert_eq!(h.conn.unechoed_moves(7), 0);
        assert!(h.conn.game(7).is_none());
    }
}

mod clock_tests {
    use super::*;

    fn adjusted(event: &GameEvent) -> (Side, i64, bool) {
        match event {
            GameEvent::ClockAdjusted {
                side,
                millis,
                running,
                ..
            } => (*side, *millis, *running),
            other => panic!("Unexpected event: {:?}", other),
        }
    }

    #[test]
    fn more_time_adds_to_projected_value() {
        let mut h = harness().with_game();
        let t0 = Instant::now();
        h.feed_at("56 7 W 300000 1", t0);
        h.feed_at("62 7 W 10", t0 + Duration::from_millis(4000));

        let events = h.take();
        assert_eq!(adjusted(&events[0]), (Side::White, 300_000, true));
        assert_eq!(adjusted(&events[1]), (Side::White, 306_000, true));
    }

    #[test]
    fn more_time_on_stopped_clock() {
        let mut h = harness().with_game();
        let t0 = Instant::now();
        h.feed_at("56 7 B 120000 0", t0);
        h.feed_at("62 7 B 15", t0 + Duration::from_millis(4000));

        let events = h.take();
        assert_eq!(adjusted(&events[1]), (Side::Black, 135_000, false));
    }

    #[test]
    fn set_clock_keeps_running_flags() {
        let mut h = harness().with_game();
        h.feed("56 7 W 250000 1");
        h.take();
        h.feed("38 7 200 180");

        let events = h.take();
        assert_eq!(adjusted(&events[0]), (Side::White, 200_000, true));
        assert_eq!(adjusted(&events[1]), (Side::Black, 180_000, false));
    }
}

mod offer_tests {
    use super::*;
    use connection::Offer;

    #[test]
    fn offers_are_reported_as_changes() {
        let mut h = harness().with_game();
        h.feed("21 7 0 1 0 0 0 0 0 0");
        h.feed("21 7 0 1 0 0 0 0 0 0");
        h.feed("21 7 0 0 0 0 0 0 0 0");

        let events = h.take();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            GameEvent::OfferUpdated {
                offer: Offer::Draw,
                side: Side::Black,
                made: true,
                ..
            }
        ));
        assert!(matches!(
            events[1],
            GameEvent::OfferUpdated {
                offer: Offer::Draw,
                side: Side::Black,
                made: false,
                ..
            }
        ));
    }
}

mod annotation_tests {
    use super::*;

    #[derive(Default)]
    struct Markup {
        seen: Mutex<Vec<(Annotation, bool)>>,
    }

    impl GameListener for Markup {
        fn game_event(&self, _event: &GameEvent) {}

        fn annotations(&self) -> Option<&dyn AnnotationListener> {
            Some(self)
        }
    }

    impl AnnotationListener for Markup {
        fn annotation(&self, event: &AnnotationEvent) {
            self.seen
                .lock()
                .unwrap()
                .push((event.annotation, event.added));
        }
    }

    #[test]
    fn annotations_reach_only_extended_listeners() {
        let mut h = harness().with_game();
        let markup = Arc::new(Markup::default());
        h.conn.add_game_listener(markup.clone());

        h.feed("60 7 A e4");
        h.feed("91 7 A e2 e4");

        let e2 = chess::parse_square("e2").unwrap();
        let e4 = chess::parse_square("e4").unwrap();
        assert_eq!(
            *markup.seen.lock().unwrap(),
            vec![
                (Annotation::Circle(e4), true),
                (Annotation::Arrow(e2, e4), false)
            ]
        );
        assert!(h.take().is_empty());
    }

    #[test]
    fn bad_square_is_a_desync() {
        let mut h = harness().with_game();
        assert!(matches!(
            h.try_feed("60 7 A z9"),
            Err(ConnectionError::BadSquare { game: 7, .. })
        ));
    }
}

mod registry_tests {
    use super::*;

    #[test]
    fn first_game_listener_enables_family_in_order() {
        let mut h = harness();
        let sent = h.sent();
        assert_eq!(sent.first().map(String::as_str), Some("set-2 33 1"));
        assert_eq!(sent[sent.len() - 2], "set-2 15 1");
        assert_eq!(sent.last().map(String::as_str), Some("set-quietly style 13"));
    }

    #[test]
    fn family_stays_enabled_until_last_listener_leaves() {
        let mut h = harness().with_game();
        let second: Arc<dyn GameListener> = Arc::new(|_: &GameEvent| {});
        h.conn.add_game_listener(second.clone());
        assert!(h.sent().is_empty());

        let first = h.listener.clone();
        h.conn.remove_game_listener(&first);
        assert!(h.sent().is_empty());
        assert!(h.conn.is_enabled(DatagramKind::MyGameStarted));

        h.conn.remove_game_listener(&second);
        let sent = h.sent();
        assert_eq!(sent.first().map(String::as_str), Some("set-2 15 0"));
        assert_eq!(sent.last().map(String::as_str), Some("set-2 33 0"));
        assert!(!h.conn.is_enabled(DatagramKind::MyGameStarted));
        assert!(h.conn.game(7).is_none());
    }

    #[test]
    fn chess_event_listener_requests_event_list() {
        let mut h = harness();
        h.sent();
        let updates = Arc::new(Mutex::new(Vec::new()));
        let sink = updates.clone();
        let listener: Arc<dyn Listener<ChessEventUpdate>> =
            Arc::new(move |e: &ChessEventUpdate| sink.lock().unwrap().push(e.clone()));
        h.conn.add_listener(listener.clone());
        assert_eq!(
            h.sent(),
            vec!["set-2 104 1", "set-2 103 1", "tell 0 events"]
        );

        h.feed("103 12 0 {Blitz arena} {tell arena join} {} {} {Join now?}");
        h.feed("103 12 0 {Blitz arena} {tell arena join} {} {} {}");
        h.feed("104 12");
        h.feed("104 12");
        let kinds: Vec<bool> = updates
            .lock()
            .unwrap()
            .iter()
            .map(|u| matches!(u, ChessEventUpdate::Added(_)))
            .collect();
        assert_eq!(kinds, vec![true, false, true, false]);

        h.conn.remove_listener(&listener);
        assert!(h.conn.chess_event(12).is_none());
    }
}

mod seek_tests {
    use super::*;

    #[test]
    fn seek_replacement_is_remove_then_add() {
        let mut h = harness();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        h.conn
            .add_listener::<SeekEvent>(Arc::new(move |e: &SeekEvent| {
                let tag = match e {
                    SeekEvent::Added(s) => format!("+{}", s.name),
                    SeekEvent::Removed(s) => format!("-{}", s.name),
                };
                sink.lock().unwrap().push(tag);
            }));

        h.feed("50 4 Carol {} 1600 0 0 Blitz 3 0 1 -1 0 9999 1 0");
        h.feed("50 4 Dave {} 1700 0 0 Blitz 3 0 1 -1 0 9999 0 0");
        assert!(h.conn.seek(4).unwrap().manual);
        h.feed("51 4 0");
        h.feed("51 4 0");

        assert_eq!(*seen.lock().unwrap(), vec!["+Carol", "-Carol", "+Dave", "-Dave"]);
    }
}

mod game_list_tests {
    use super::*;

    const ITEM: &str = "1500 Bob 1600 1 Blitz 0 5 0 C20 1 1 0 {}";

    #[test]
    fn items_are_delivered_in_one_batch() {
        let mut h = harness();
        let lists = Arc::new(Mutex::new(Vec::new()));
        let sink = lists.clone();
        h.conn
            .add_listener::<GameList>(Arc::new(move |l: &GameList| {
                sink.lock().unwrap().push(l.clone())
            }));

        h.feed("73 history Alice 2 1 2 {2 games}");
        h.feed(&format!("74 1 100 ICC 2024.01.01 12:00:00 Alice {}", ITEM));
        assert!(lists.lock().unwrap().is_empty());
        h.feed(&format!("74 2 101 ICC 2024.01.02 12:00:00 Alice {}", ITEM));

        let lists = lists.lock().unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].items.len(), 2);
        assert_eq!(lists[0].items[1].game_id, "101");
        drop(lists);

        assert!(matches!(
            h.try_feed(&format!("74 3 102 ICC 2024.01.03 12:00:00 Alice {}", ITEM)),
            Err(ConnectionError::OrphanGameListItem)
        ));
    }

    #[test]
    fn unknown_category_is_a_desync() {
        let mut h = harness();
        h.conn
            .add_listener::<GameList>(Arc::new(|_: &GameList| {}));
        assert!(matches!(
            h.try_feed("73 observe Alice 1 1 1 {}"),
            Err(ConnectionError::UnknownGameListCategory(_))
        ));
    }
}
