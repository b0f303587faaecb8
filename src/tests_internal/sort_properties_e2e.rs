use std::sync::Arc;

use arrow::{
    array::{Array, ArrayRef, AsArray, Float64Array, Int64Array, StringArray, UInt32Array},
    datatypes::{DataType, Field, Int64Type, Schema, UInt32Type},
    record_batch::RecordBatch,
};

use crate::sort::{
    apply_permutation, is_already_sorted, resolve_sort_columns, sort_batch,
    stable_get_permutation, stable_sort_batch, NullsOrder, SortColumnDescription,
};

/// Block with a small-domain nullable key, a string key, a float key and the
/// original row position in `pos`.
fn random_block(rng: &mut fastrand::Rng, rows: usize) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("a", DataType::Int64, true),
        Field::new("b", DataType::Utf8, false),
        Field::new("c", DataType::Float64, false),
        Field::new("pos", DataType::UInt32, false),
    ]));
    let a: Int64Array = (0..rows)
        .map(|_| (rng.u8(..10) != 0).then(|| rng.i64(-3..4)))
        .collect();
    let b: StringArray = (0..rows)
        .map(|_| Some(["x", "y", "z"][rng.usize(..3)]))
        .collect();
    let c: Float64Array = (0..rows).map(|_| Some(rng.f64() * 4.0)).collect();
    let pos: UInt32Array = (0..rows as u32).map(Some).collect();
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(a) as ArrayRef,
            Arc::new(b) as ArrayRef,
            Arc::new(c) as ArrayRef,
            Arc::new(pos) as ArrayRef,
        ],
    )
    .expect("block")
}

fn descriptions() -> Vec<Vec<SortColumnDescription>> {
    vec![
        vec![SortColumnDescription::asc("a")],
        vec![SortColumnDescription::desc("a").nulls(NullsOrder::First)],
        vec![
            SortColumnDescription::asc("b"),
            SortColumnDescription::desc("a"),
        ],
        vec![
            SortColumnDescription::desc("b"),
            SortColumnDescription::asc("a").nulls(NullsOrder::First),
            SortColumnDescription::asc("c"),
        ],
    ]
}

fn positions(block: &RecordBatch) -> Vec<u32> {
    block
        .column_by_name("pos")
        .expect("pos column")
        .as_primitive::<UInt32Type>()
        .values()
        .to_vec()
}

fn assert_non_decreasing(block: &RecordBatch, desc: &[SortColumnDescription], rows: usize) {
    let columns = resolve_sort_columns(block, desc).expect("resolve");
    let less = columns.less();
    for i in 1..rows {
        assert!(!less.less(i, i - 1), "rows {} and {} inverted", i - 1, i);
    }
}

#[test]
fn full_sort_is_non_decreasing() {
    let mut rng = fastrand::Rng::with_seed(7);
    for desc in descriptions() {
        for rows in [0, 1, 2, 17, 120] {
            let mut block = random_block(&mut rng, rows);
            sort_batch(&mut block, &desc, 0).expect("sort");
            assert_non_decreasing(&block, &desc, rows);
            assert!(is_already_sorted(&block, &desc).expect("check"));

            let mut seen = positions(&block);
            seen.sort_unstable();
            assert_eq!(seen, (0..rows as u32).collect::<Vec<_>>());
        }
    }
}

#[test]
fn partial_sort_prefix_matches_full_sort() {
    let mut rng = fastrand::Rng::with_seed(11);
    for desc in descriptions() {
        for limit in [1, 5, 63, 99, 100, 250] {
            let original = random_block(&mut rng, 100);

            let mut partial = original.clone();
            sort_batch(&mut partial, &desc, limit).expect("partial");
            let mut stable = original.clone();
            stable_sort_batch(&mut stable, &desc).expect("stable");

            let prefix = limit.min(100);
            let partial_columns = resolve_sort_columns(&partial, &desc).expect("resolve");
            let stable_columns = resolve_sort_columns(&stable, &desc).expect("resolve");
            // Keys of the prefix must equal the keys of the k smallest rows.
            for i in 0..prefix {
                for (p, s) in partial_columns.iter().zip(stable_columns.iter()) {
                    let left = p.column().array().slice(i, 1);
                    let right = s.column().array().slice(i, 1);
                    assert_eq!(left.as_ref(), right.as_ref(), "row {i}");
                }
            }
            assert_non_decreasing(&partial.slice(0, prefix), &desc, prefix);

            let mut seen = positions(&partial);
            seen.sort_unstable();
            assert_eq!(seen, (0..100).collect::<Vec<_>>());
        }
    }
}

#[test]
fn stable_sort_preserves_tie_order_and_is_idempotent() {
    let mut rng = fastrand::Rng::with_seed(23);
    for desc in descriptions() {
        let mut block = random_block(&mut rng, 200);
        stable_sort_batch(&mut block, &desc).expect("stable");

        let columns = resolve_sort_columns(&block, &desc).expect("resolve");
        let less = columns.less();
        let pos = positions(&block);
        for i in 1..pos.len() {
            if less.compare(i - 1, i).is_eq() {
                assert!(pos[i - 1] < pos[i], "tie at {i} reordered");
            }
        }

        let before = positions(&block);
        stable_sort_batch(&mut block, &desc).expect("again");
        assert_eq!(positions(&block), before);
    }
}

#[test]
fn permutation_matches_stable_sort() {
    let mut rng = fastrand::Rng::with_seed(31);
    for desc in descriptions() {
        let block = random_block(&mut rng, 150);
        let permutation = stable_get_permutation(&block, &desc).expect("perm");
        let permuted = apply_permutation(&block, &permutation).expect("apply");

        let mut sorted = block.clone();
        stable_sort_batch(&mut sorted, &desc).expect("stable");
        assert_eq!(permuted, sorted);
        assert_eq!(positions(&permuted), permutation);
    }
}

#[test]
fn already_sorted_detects_single_inversion() {
    let mut rng = fastrand::Rng::with_seed(43);
    let desc = vec![SortColumnDescription::asc("a")];
    for rows in [2, 30, 51, 500] {
        let mut block = random_block(&mut rng, rows);
        stable_sort_batch(&mut block, &desc).expect("sort");
        assert!(is_already_sorted(&block, &desc).expect("sorted"));

        let keys = block.column(0).as_primitive::<Int64Type>();
        let Some(i) = (1..rows).find(|&i| keys.value(i - 1) != keys.value(i) && keys.is_valid(i))
        else {
            continue;
        };
        let mut permutation: Vec<u32> = (0..rows as u32).collect();
        permutation.swap(i - 1, i);
        let broken = apply_permutation(&block, &permutation).expect("swap");
        assert!(!is_already_sorted(&broken, &desc).expect("unsorted"));
    }
}

#[test]
fn duplicate_keys_keep_insertion_order() {
    let schema = Arc::new(Schema::new(vec![Field::new("k", DataType::Int64, false)]));
    let block = RecordBatch::try_new(
        schema,
        vec![Arc::new(Int64Array::from(vec![3, 1, 2, 1, 5])) as ArrayRef],
    )
    .expect("block");
    let desc = vec![SortColumnDescription::asc("k")];
    assert_eq!(
        stable_get_permutation(&block, &desc).expect("perm"),
        vec![1, 3, 2, 0, 4]
    );
}
