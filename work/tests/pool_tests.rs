use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nanpow_kernel::{KernelError, KernelSource};
use nanpow_nullables::{CountingSpawner, KernelCall, NullSeedSource, ScriptedKernelFactory};
use nanpow_types::{BlockHash, SeedPair};
use nanpow_work::{derive_nonce, validate_work, SpawnerKind, WorkConfig, WorkError, WorkPool};

const HASH: [u8; 32] = [0x42; 32];
const SEEDS: SeedPair = SeedPair {
    work0: [0x11, 0x22, 0x33, 0x44],
    work1: [0xAA, 0xBB, 0xCC, 0xDD],
};
/// x_index 0, y_index 0, x_pos 3, y_pos 4.
const WORD: u32 = 0x0101_0304;

fn config(lanes: usize) -> WorkConfig {
    WorkConfig {
        lanes,
        ..WorkConfig::default()
    }
}

/// A pool over a scripted kernel with fixed seeds and counted spawns.
fn scripted_pool(
    lanes: usize,
    kernel: &ScriptedKernelFactory,
) -> (WorkPool, Arc<CountingSpawner>, Arc<NullSeedSource>) {
    let spawner = Arc::new(CountingSpawner::threads());
    let seeds = Arc::new(NullSeedSource::constant(SEEDS));
    let pool = WorkPool::new(&config(lanes))
        .unwrap()
        .with_kernel(kernel.module())
        .with_spawner(spawner.clone())
        .with_seed_source(seeds.clone());
    (pool, spawner, seeds)
}

fn is_first_block(call: &KernelCall) -> bool {
    call.args.block_offset_x == 0 && call.args.block_offset_y == 0
}

#[tokio::test]
async fn native_nonce_passes_validation() {
    let pool = WorkPool::new(&config(4)).unwrap();
    let difficulty = 0xF000_0000;

    let nonce = pool.compute_proof_of_work(&HASH, difficulty).await.unwrap();

    assert!(validate_work(&BlockHash::new(HASH), &nonce, difficulty));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocking_task_lanes_find_valid_nonces() {
    let config = WorkConfig {
        lanes: 4,
        spawner: SpawnerKind::Blocking,
        ..WorkConfig::default()
    };
    let pool = WorkPool::new(&config).unwrap();
    let difficulty = 0xC000_0000;

    for byte in [0x01u8, 0x02, 0x03] {
        let hash = [byte; 32];
        let nonce = pool.compute_proof_of_work(&hash, difficulty).await.unwrap();
        assert!(validate_work(&BlockHash::new(hash), &nonce, difficulty));
    }
}

#[tokio::test]
async fn concurrent_ensure_ready_starts_lanes_once() {
    let kernel = ScriptedKernelFactory::never_finds();
    let (pool, spawner, _) = scripted_pool(6, &kernel);

    let (a, b, c) = tokio::join!(pool.ensure_ready(), pool.ensure_ready(), pool.ensure_ready());
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    pool.ensure_ready().await.unwrap();

    assert!(pool.is_ready());
    assert_eq!(spawner.spawned(), 6);
    assert_eq!(kernel.instances(), 6);
}

#[tokio::test]
async fn first_success_settles_the_round() {
    // Two lanes find something in every round; the call must resolve once,
    // with one of their nonces.
    let kernel = ScriptedKernelFactory::new(|call| {
        Ok(match (call.args.block_offset_x, call.args.block_offset_y) {
            (0, 0) => 0x0101_0304,
            (256, 256) => 0x0202_0506,
            _ => 0,
        })
    });
    let (pool, _, _) = scripted_pool(4, &kernel);
    let expected = [
        derive_nonce(0x0101_0304, SEEDS),
        derive_nonce(0x0202_0506, SEEDS),
    ];

    let first = pool.compute_proof_of_work(&HASH, 0).await.unwrap();
    assert!(expected.contains(&first));
    assert_eq!(pool.rounds_started(), 1);

    // Leftovers of round 1 must not leak into round 2.
    let second = pool.compute_proof_of_work(&HASH, 0).await.unwrap();
    assert!(expected.contains(&second));
    assert_eq!(pool.rounds_started(), 2);
}

#[tokio::test]
async fn empty_rounds_restart_with_fresh_seeds() {
    let kernel = ScriptedKernelFactory::new(|call| {
        Ok(if call.call >= 3 && is_first_block(call) {
            WORD
        } else {
            0
        })
    });
    let (pool, spawner, seeds) = scripted_pool(4, &kernel);

    let nonce = pool.compute_proof_of_work(&HASH, 0).await.unwrap();

    assert_eq!(nonce, derive_nonce(WORD, SEEDS));
    assert_eq!(pool.rounds_started(), 4);
    assert_eq!(seeds.drawn(), 4);
    // Three full rounds, plus at least the winning call of the fourth.
    assert!(kernel.calls() >= 13);
    assert_eq!(spawner.spawned(), 4, "lanes are reused across rounds");
}

#[tokio::test]
async fn malformed_hash_is_rejected_before_any_lane_starts() {
    let kernel = ScriptedKernelFactory::always_finds(WORD);
    let (pool, spawner, _) = scripted_pool(4, &kernel);

    for len in [0, 31, 33] {
        let err = pool.compute_proof_of_work(&vec![0u8; len], 0).await.unwrap_err();
        assert!(matches!(err, WorkError::Input(_)), "{len}: {err}");
    }

    assert!(!pool.is_ready());
    assert_eq!(spawner.spawned(), 0);
    assert_eq!(kernel.instances(), 0);
}

#[tokio::test]
async fn crashed_lane_is_replaced() {
    // The first instance blows up; only a replacement ever finds anything.
    let kernel = ScriptedKernelFactory::new(|call| match call.instance {
        0 => panic!("kernel blew up"),
        i if i >= 4 => Ok(WORD),
        _ => Ok(0),
    });
    let (pool, spawner, _) = scripted_pool(4, &kernel);

    let nonce = pool.compute_proof_of_work(&HASH, 0).await.unwrap();

    assert_eq!(nonce, derive_nonce(WORD, SEEDS));
    assert_eq!(pool.rounds_started(), 2);
    assert_eq!(spawner.spawned(), 5);
    assert_eq!(kernel.instances(), 5);
}

#[tokio::test]
async fn trapping_lane_counts_toward_exhaustion() {
    let kernel = ScriptedKernelFactory::new(|call| {
        if call.instance == 0 && call.call == 0 {
            Err(KernelError::Trap("unreachable".to_string()))
        } else if call.call >= 1 && is_first_block(call) {
            Ok(WORD)
        } else {
            Ok(0)
        }
    });
    let (pool, spawner, _) = scripted_pool(2, &kernel);

    pool.compute_proof_of_work(&HASH, 0).await.unwrap();

    assert_eq!(spawner.spawned(), 3);
}

#[tokio::test]
async fn malformed_bytecode_fails_to_load_and_spawns_nothing() {
    let spawner = Arc::new(CountingSpawner::threads());
    let pool = WorkPool::new(&config(4))
        .unwrap()
        .with_kernel(KernelSource::Bytecode(Arc::from(&b"not a kernel"[..])))
        .with_spawner(spawner.clone());

    for _ in 0..2 {
        let err = pool.compute_proof_of_work(&HASH, 0).await.unwrap_err();
        assert!(matches!(err, WorkError::Load(_)), "{err}");
    }

    assert!(!pool.is_ready());
    assert_eq!(spawner.spawned(), 0);
}

#[tokio::test]
async fn missing_kernel_file_is_a_load_error() {
    let config = WorkConfig {
        lanes: 2,
        kernel_path: Some("/nonexistent/pow.wasm".into()),
        ..WorkConfig::default()
    };
    let pool = WorkPool::new(&config).unwrap();
    let err = pool.ensure_ready().await.unwrap_err();
    assert!(matches!(err, WorkError::Load(KernelError::Read(_))));
}

#[tokio::test]
async fn lane_init_failure_leaves_no_pool() {
    let kernel = ScriptedKernelFactory::failing_instantiation();
    let (pool, _, _) = scripted_pool(3, &kernel);

    let err = pool.ensure_ready().await.unwrap_err();
    assert!(matches!(err, WorkError::LaneInit { .. }), "{err}");
    assert!(!pool.is_ready());
}

#[tokio::test]
async fn hung_lane_is_abandoned_after_round_timeout() {
    let kernel = ScriptedKernelFactory::new(|call| {
        if !is_first_block(call) {
            return Ok(0);
        }
        if call.call == 0 {
            std::thread::sleep(Duration::from_millis(300));
            return Ok(0);
        }
        Ok(WORD)
    });
    let (pool, _, _) = scripted_pool(4, &kernel);
    let pool = pool.with_round_timeout(Some(Duration::from_millis(50)));

    let nonce = pool.compute_proof_of_work(&HASH, 0).await.unwrap();

    assert_eq!(nonce, derive_nonce(WORD, SEEDS));
    assert!(pool.rounds_started() >= 2);
}

#[tokio::test]
async fn abandoned_call_does_not_poison_the_pool() {
    let finding = Arc::new(AtomicBool::new(false));
    let switch = finding.clone();
    let kernel = ScriptedKernelFactory::new(move |call| {
        Ok(if switch.load(Ordering::SeqCst) && is_first_block(call) {
            WORD
        } else {
            0
        })
    });
    let (pool, _, _) = scripted_pool(4, &kernel);

    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), pool.compute_proof_of_work(&HASH, 0)).await;
    assert!(abandoned.is_err());

    finding.store(true, Ordering::SeqCst);
    let nonce = pool.compute_proof_of_work(&HASH, 0).await.unwrap();
    assert_eq!(nonce, derive_nonce(WORD, SEEDS));
}

#[tokio::test]
async fn lane_failing_on_a_settled_round_still_answers_the_next() {
    // One lane finds at once and settles the first call. The other traps
    // late, on work of that settled round, while the second call is already
    // waiting on it. No round timeout is set.
    let kernel = ScriptedKernelFactory::new(|call| match (call.instance, call.call) {
        (0, 0) => Ok(WORD),
        (1, 0) => {
            std::thread::sleep(Duration::from_millis(300));
            Err(KernelError::Trap("unreachable".to_string()))
        }
        (i, _) if i >= 2 => Ok(WORD),
        _ => Ok(0),
    });
    let (pool, spawner, _) = scripted_pool(2, &kernel);

    let first = pool.compute_proof_of_work(&HASH, 0).await.unwrap();
    assert_eq!(first, derive_nonce(WORD, SEEDS));

    let second = tokio::time::timeout(Duration::from_secs(5), pool.compute_proof_of_work(&HASH, 0))
        .await
        .expect("second call must not hang")
        .unwrap();
    assert_eq!(second, derive_nonce(WORD, SEEDS));
    assert_eq!(pool.rounds_started(), 3);
    assert_eq!(spawner.spawned(), 3);
}
