use std::{
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc, Arc, Barrier,
    },
    thread,
    time::Duration,
};

use tempfile::TempDir;

use crate::{
    marks::{write_marks_file, BoxError, MarkCache, MarksError, MarksLoader},
    MarkInCompressedFile, MarksInCompressedFile, MarksLoaderOptions,
};

fn sample_marks(marks_count: u64, columns_num: usize) -> MarksInCompressedFile {
    let marks = (0..marks_count)
        .flat_map(|row| {
            (0..columns_num as u64)
                .map(move |col| MarkInCompressedFile::new(row * 65_536, col * 8_192))
        })
        .collect();
    MarksInCompressedFile::new(marks, columns_num).expect("marks")
}

/// Many readers opening the same file at once trigger exactly one load.
#[test]
fn concurrent_loaders_share_a_single_load() {
    const READERS: usize = 12;
    let cache = Arc::new(MarkCache::new());
    let loads = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(READERS));

    let handles: Vec<_> = (0..READERS)
        .map(|reader| {
            let cache = Arc::clone(&cache);
            let loads = Arc::clone(&loads);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut loader = MarksLoader::new(
                    Some(cache),
                    "table/all_1_1_0/value.mrk",
                    Box::new(move || -> Result<MarksInCompressedFile, BoxError> {
                        loads.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(25));
                        Ok(sample_marks(8, 3))
                    }),
                    MarksLoaderOptions::default().columns_num(3),
                );
                barrier.wait();
                loader
                    .get_mark(reader % 8, reader % 3)
                    .expect("mark lookup")
            })
        })
        .collect();

    for (reader, handle) in handles.into_iter().enumerate() {
        let mark = handle.join().expect("reader thread");
        assert_eq!(
            mark,
            MarkInCompressedFile::new((reader % 8) as u64 * 65_536, (reader % 3) as u64 * 8_192)
        );
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.metrics().loads, 1);
}

/// Distinct files load independently even when requested together.
#[test]
fn distinct_files_load_independently() {
    let cache = Arc::new(MarkCache::new());
    let loads = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..4)
        .map(|file| {
            let cache = Arc::clone(&cache);
            let loads = Arc::clone(&loads);
            thread::spawn(move || {
                let mut loader = MarksLoader::new(
                    Some(cache),
                    format!("part_{file}/k.mrk"),
                    Box::new(move || -> Result<MarksInCompressedFile, BoxError> {
                        loads.fetch_add(1, Ordering::SeqCst);
                        Ok(sample_marks(file + 1, 1))
                    }),
                    MarksLoaderOptions::default(),
                );
                loader.marks_count().expect("count")
            })
        })
        .collect();

    let mut counts: Vec<usize> = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .collect();
    counts.sort_unstable();
    assert_eq!(counts, vec![1, 2, 3, 4]);
    assert_eq!(loads.load(Ordering::SeqCst), 4);
    assert_eq!(cache.len(), 4);
}

/// A slow load of one file does not hold up lookups of another.
#[test]
fn slow_load_does_not_block_other_keys() {
    let cache = Arc::new(MarkCache::new());
    let slow_key = cache.hash("part_slow/k.mrk");
    let fast_key = cache.hash("part_fast/k.mrk");
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let slow = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            cache.get_or_set(slow_key, move || {
                started_tx.send(()).expect("signal start");
                release_rx.recv().expect("release");
                Ok::<_, io::Error>(Arc::new(sample_marks(2, 1)))
            })
        })
    };
    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("slow load started");

    let (done_tx, done_rx) = mpsc::channel();
    let fast = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            let marks = cache
                .get_or_set(fast_key, || Ok::<_, io::Error>(Arc::new(sample_marks(3, 1))))
                .expect("fast load");
            done_tx.send(marks.marks_count()).expect("signal done");
        })
    };

    let fast_result = done_rx.recv_timeout(Duration::from_secs(5));
    release_tx.send(()).expect("release slow load");
    assert_eq!(fast_result.expect("fast key finished while slow key loads"), 3);

    fast.join().expect("fast thread");
    let slow_marks = slow.join().expect("slow thread").expect("slow load");
    assert_eq!(slow_marks.marks_count(), 2);
    assert_eq!(cache.len(), 2);
}

/// A read-through loader neither populates the cache nor blocks later saves.
#[test]
fn read_through_then_save() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("id.mrk");
    write_marks_file(&path, &sample_marks(5, 2)).expect("write");
    let cache = Arc::new(MarkCache::new());
    let key = cache.hash(&path);

    let options = MarksLoaderOptions::default().columns_num(2);
    let mut scanner = MarksLoader::from_file(
        Some(cache.clone()),
        &path,
        options.save_marks_in_cache(false),
    );
    assert_eq!(
        scanner.get_mark(4, 1).expect("mark"),
        MarkInCompressedFile::new(4 * 65_536, 8_192)
    );
    assert!(cache.get(&key).is_none());

    let mut reader = MarksLoader::from_file(Some(cache.clone()), &path, options);
    assert_eq!(reader.marks_count().expect("count"), 5);
    assert!(cache.get(&key).is_some());

    // Once cached, the file itself is no longer consulted.
    std::fs::remove_file(&path).expect("remove");
    let mut late = MarksLoader::from_file(Some(cache.clone()), &path, options);
    assert_eq!(
        late.get_mark(0, 1).expect("cached mark"),
        MarkInCompressedFile::new(0, 8_192)
    );
    let mut uncached = MarksLoader::from_file(None, &path, options);
    assert!(matches!(
        uncached.get_mark(0, 0),
        Err(MarksError::LoadFailed { .. })
    ));
}

/// Evicting an entry does not invalidate loaders that already hold it.
#[test]
fn eviction_keeps_loader_arrays_alive() {
    let cache = Arc::new(MarkCache::new());
    let loads = Arc::new(AtomicUsize::new(0));
    let make_loader = |loads: Arc<AtomicUsize>| {
        MarksLoader::new(
            Some(cache.clone()),
            "evict.mrk",
            Box::new(move || -> Result<MarksInCompressedFile, BoxError> {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(sample_marks(2, 1))
            }),
            MarksLoaderOptions::default(),
        )
    };

    let mut first = make_loader(loads.clone());
    first.get_mark(1, 0).expect("mark");
    cache.reset();
    assert!(cache.is_empty());
    assert_eq!(
        first.get_mark(1, 0).expect("memoized"),
        MarkInCompressedFile::new(65_536, 0)
    );
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    let mut second = make_loader(loads.clone());
    second.get_mark(0, 0).expect("reload");
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}
