//! Session change notifications

use fairdice::{
    parse_place_bet_response, BetProgressionConfig, BetProgressionSimulator, BatchResult, GuessRange, Micros,
    Satoshis, SessionEvent, SessionLedger,
};
use tokio::sync::broadcast::error::TryRecvError;

fn replayed_batch() -> fairdice::ReconstructedBatch {
    let config = BetProgressionConfig::new(Satoshis::from_sat(-1), GuessRange::new(0, 989_999).unwrap())
        .with_increase_on_lose(Micros::ONE)
        .with_reset_on_win(true)
        .with_max_bets(3);
    let batch = BatchResult {
        bet_id: 300,
        bet_count: 3,
        server_seed: "11".repeat(32),
        client_seed: 0,
        total_pay_in: Satoshis::from_sat(-4),
        total_pay_out: Satoshis::from_sat(3),
        starting_balance: Satoshis::from_coins(1),
    };
    let secrets = [100u32, 999_000, 50];
    BetProgressionSimulator::new(config)
        .unwrap()
        .verify_with(&batch, &|i: u32| secrets[i as usize])
        .unwrap()
}

#[tokio::test]
async fn test_batch_emits_single_event_after_update() {
    let mut ledger = SessionLedger::new(Satoshis::from_coins(1), 0);
    let mut events = ledger.subscribe();

    ledger.apply_batch(&replayed_batch());

    let event = events.recv().await.unwrap();
    assert_eq!(
        event,
        SessionEvent::BatchSettled {
            bet_id: 300,
            bet_count: 3,
            win_count: 2,
            balance: Satoshis::from_sat(99_999_999),
        }
    );
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    let state = ledger.snapshot();
    assert_eq!(state.bet_pay_in, Satoshis::from_sat(-4));
    assert_eq!(state.bet_pay_out, Satoshis::from_sat(3));
    assert_eq!(state.profit(), Satoshis::from_sat(-1));
}

#[tokio::test]
async fn test_single_bet_and_seed_change_events() {
    let mut ledger = SessionLedger::new(Satoshis::from_coins(5), 1);
    let mut events = ledger.subscribe();

    let bet = parse_place_bet_response(
        r#"{"BetId": 77, "PayOut": 199800000, "Secret": 123456, "StartingBalance": 500000000, "ServerSeed": "ab"}"#,
    )
    .unwrap();
    ledger.record_single_bet(Satoshis::from_coins(-1), GuessRange::new(0, 499_999).unwrap(), &bet);
    ledger.set_client_seed(99);

    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::BetSettled {
            bet_id: 77,
            won: true,
            balance: Satoshis::from_sat(599_800_000),
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::ClientSeedChanged { client_seed: 99 }
    );
    assert_eq!(ledger.snapshot().bet_win_count, 1);
    assert_eq!(ledger.client_seed(), 99);
}

#[tokio::test]
async fn test_lagging_subscriber_sees_lag() {
    let mut ledger = SessionLedger::with_event_buffer(Satoshis::ZERO, 0, 2);
    let mut events = ledger.subscribe();

    for seed in 0..5 {
        ledger.set_client_seed(seed);
    }

    assert!(matches!(
        events.recv().await,
        Err(tokio::sync::broadcast::error::RecvError::Lagged(3))
    ));
    assert_eq!(events.recv().await.unwrap(), SessionEvent::ClientSeedChanged { client_seed: 3 });
}
