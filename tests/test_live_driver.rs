mod common;

use std::sync::Arc;
use std::time::Duration;

use posterquiz::bank::ServiceId;
use posterquiz::clock::{Clock, TokioClock};
use posterquiz::config::GameConfig;
use posterquiz::game::Phase;
use posterquiz::observability::{EventKind, MemorySink, SessionEventLogger};
use posterquiz::session::{GameSession, InputEvent};
use posterquiz::session_id::MemoryStore;
use posterquiz::ui::RecordingUi;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct LiveSession {
    tx: mpsc::UnboundedSender<InputEvent>,
    cancel: CancellationToken,
    sink: MemorySink,
    handle: JoinHandle<GameSession<RecordingUi>>,
}

fn spawn_session() -> LiveSession {
    let clock = TokioClock::start();
    let shared: Arc<dyn Clock> = Arc::new(clock);
    let sink = MemorySink::new();
    let logger = SessionEventLogger::new(Arc::clone(&shared), Box::new(sink.clone()));
    let session = GameSession::new(
        &GameConfig::default(),
        shared,
        &MemoryStore::new(),
        logger,
        RecordingUi::new(),
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(session.run(clock, rx, cancel.clone()));
    LiveSession {
        tx,
        cancel,
        sink,
        handle,
    }
}

async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn live_session_plays_a_full_game() {
    let live = spawn_session();

    live.tx.send(InputEvent::MarkerFound).unwrap();
    sleep_ms(4600).await;
    for service in ["s3", "lambda", "s3"] {
        live.tx
            .send(InputEvent::Select(ServiceId::new(service)))
            .unwrap();
        sleep_ms(2600).await;
    }

    live.cancel.cancel();
    let session = live.handle.await.unwrap();
    assert_eq!(session.state().phase, Phase::Completed);
    assert_eq!(session.state().score, 2);
    assert_eq!(
        live.sink.kinds(),
        vec![
            EventKind::GameStarted,
            EventKind::AnswerSubmitted,
            EventKind::AnswerSubmitted,
            EventKind::AnswerSubmitted,
            EventKind::GameCompleted,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn live_flicker_is_absorbed() {
    let live = spawn_session();

    live.tx.send(InputEvent::MarkerFound).unwrap();
    sleep_ms(5000).await;
    live.tx.send(InputEvent::MarkerLost).unwrap();
    sleep_ms(100).await;
    live.tx.send(InputEvent::MarkerFound).unwrap();
    sleep_ms(1000).await;

    live.cancel.cancel();
    let session = live.handle.await.unwrap();
    assert_eq!(session.state().phase, Phase::QuestionShown);
    assert_eq!(live.sink.kinds(), vec![EventKind::GameStarted]);
}

#[tokio::test(start_paused = true)]
async fn live_loss_pauses_until_found() {
    let live = spawn_session();

    live.tx.send(InputEvent::MarkerFound).unwrap();
    sleep_ms(5000).await;
    live.tx.send(InputEvent::MarkerLost).unwrap();
    sleep_ms(1000).await;
    live.tx
        .send(InputEvent::Select(ServiceId::new("s3")))
        .unwrap();
    sleep_ms(100).await;

    live.cancel.cancel();
    let session = live.handle.await.unwrap();
    assert_eq!(session.state().phase, Phase::MarkerLost);
    assert_eq!(session.machine().underlying_phase(), Phase::QuestionShown);
    assert_eq!(live.sink.kinds(), vec![EventKind::GameStarted]);
}

#[tokio::test(start_paused = true)]
async fn closing_the_input_channel_stops_the_driver() {
    let live = spawn_session();
    live.tx.send(InputEvent::SceneLoaded).unwrap();
    drop(live.tx);

    let session = live.handle.await.unwrap();
    assert_eq!(session.state().phase, Phase::AwaitingMarker);
}
