use proptest::prelude::*;

use carve::{page_base, HEAP, HUGE_PAGE_TAG, MINI_HUGE_THRESHOLD, MINI_PAGE_TAG};

#[derive(Debug, Clone)]
enum Op {
    Alloc(usize),
    Release(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1usize..4096).prop_map(Op::Alloc),
        1 => (MINI_HUGE_THRESHOLD..MINI_HUGE_THRESHOLD * 8).prop_map(Op::Alloc),
        4 => any::<usize>().prop_map(Op::Release),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Arbitrary interleavings of allocate and release keep every live block
    /// intact, correctly tagged, and byte-exact until its own release.
    #[test]
    fn random_alloc_release_sequences_stay_consistent(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let mut live: Vec<(core::ptr::NonNull<u8>, usize, u8)> = Vec::new();
        for (i, op) in ops.into_iter().enumerate() {
            match op {
                Op::Alloc(size) => {
                    let block = HEAP.allocate(size).unwrap();
                    let expected = if size < MINI_HUGE_THRESHOLD { MINI_PAGE_TAG } else { HUGE_PAGE_TAG };
                    let fill = (i % 251) as u8;
                    unsafe {
                        prop_assert_eq!(page_base(block.as_ptr()).cast::<u16>().read(), expected);
                        block.as_ptr().write_bytes(fill, size);
                    }
                    live.push((block, size, fill));
                }
                Op::Release(pick) => {
                    if live.is_empty() {
                        continue;
                    }
                    let (block, size, fill) = live.swap_remove(pick % live.len());
                    unsafe {
                        prop_assert_eq!(block.as_ptr().read(), fill);
                        prop_assert_eq!(block.as_ptr().add(size - 1).read(), fill);
                        HEAP.release(block);
                    }
                }
            }
        }
        for (block, size, fill) in live {
            unsafe {
                prop_assert_eq!(block.as_ptr().read(), fill);
                prop_assert_eq!(block.as_ptr().add(size - 1).read(), fill);
                HEAP.release(block);
            }
        }
    }
}
