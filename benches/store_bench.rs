//! Benchmarks for hashmap and sorted-set operations.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use bucketdb::bucket::skiplist::SkipList;
use bucketdb::{DB, Options, SyncPolicy};

fn bench_options() -> Options {
    // fsync on every commit would measure the disk, not the store.
    Options::default().sync_policy(SyncPolicy::EveryNWrites(1024))
}

fn member(i: u64) -> Vec<u8> {
    format!("member:{:08}", i).into_bytes()
}

fn bench_skiplist(c: &mut Criterion) {
    let mut group = c.benchmark_group("skiplist");

    for size in [1_000u64, 10_000] {
        let keys: Vec<Vec<u8>> = (0..size).map(member).collect();

        group.bench_with_input(BenchmarkId::new("insert", size), &keys, |b, keys| {
            b.iter(|| {
                let mut sl = SkipList::new();
                for key in keys {
                    sl.insert(key.clone(), Vec::new());
                }
                black_box(sl.len())
            });
        });

        let mut sl = SkipList::new();
        for key in &keys {
            sl.insert(key.clone(), key.clone());
        }
        group.bench_with_input(BenchmarkId::new("get", size), &keys, |b, keys| {
            b.iter(|| {
                let mut hits = 0usize;
                for key in keys {
                    if sl.get(key).is_some() {
                        hits += 1;
                    }
                }
                black_box(hits)
            });
        });
    }

    group.finish();
}

fn bench_hash(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let db = DB::open_with(dir.path().join("hash.db"), bench_options()).unwrap();
    for i in 0..10_000u64 {
        db.hset("bench", &member(i), b"value").unwrap();
    }

    let mut group = c.benchmark_group("hash");
    let mut i = 0u64;
    group.bench_function("hset", |b| {
        b.iter(|| {
            i = (i + 1) % 10_000;
            db.hset("bench", &member(i), b"updated").unwrap();
        });
    });
    group.bench_function("hget", |b| {
        b.iter(|| {
            i = (i + 7) % 10_000;
            black_box(db.hget("bench", &member(i)))
        });
    });
    group.bench_function("hincr", |b| {
        b.iter(|| black_box(db.hincr("bench", b"counter", 1).unwrap()));
    });
    group.bench_function("hscan_100", |b| {
        b.iter(|| black_box(db.hscan("bench", b"member:00005000", 100)));
    });
    group.finish();
}

fn bench_zset(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let db = DB::open_with(dir.path().join("zset.db"), bench_options()).unwrap();
    for i in 0..10_000u64 {
        db.zset("board", &member(i), i * 31 % 1_000).unwrap();
    }

    let mut group = c.benchmark_group("zset");
    let mut i = 0u64;
    group.bench_function("zset_rescore", |b| {
        b.iter(|| {
            i = (i + 1) % 10_000;
            db.zset("board", &member(i), i * 17 % 1_000).unwrap();
        });
    });
    group.bench_function("zincr", |b| {
        b.iter(|| {
            i = (i + 3) % 10_000;
            black_box(db.zincr("board", &member(i), 1).unwrap())
        });
    });
    group.bench_function("zget", |b| {
        b.iter(|| {
            i = (i + 7) % 10_000;
            black_box(db.zget("board", &member(i)))
        });
    });
    for limit in [10usize, 100] {
        group.bench_with_input(BenchmarkId::new("zscan", limit), &limit, |b, &limit| {
            b.iter(|| black_box(db.zscan("board", b"", Some(500), limit)));
        });
        group.bench_with_input(BenchmarkId::new("zrscan", limit), &limit, |b, &limit| {
            b.iter(|| black_box(db.zrscan("board", b"", Some(500), limit)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_skiplist, bench_hash, bench_zset);
criterion_main!(benches);
