use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Counts elements produced by the add hook and elements handed to the
/// remove hook, so a test can check that every element is released once.
#[derive(Default)]
struct Ledger {
    acquired: Rc<Cell<usize>>,
    released: Rc<Cell<usize>>,
}

impl Ledger {
    fn config<T: Copy + 'static>(&self, config: Config<T>) -> Config<T> {
        let acquired = Rc::clone(&self.acquired);
        let released = Rc::clone(&self.released);
        config
            .with_add_hook(move |x: T| {
                acquired.set(acquired.get() + 1);
                Some(x)
            })
            .with_remove_hook(move |_| released.set(released.get() + 1))
    }

    fn assert_balanced(&self) {
        assert_eq!(
            self.acquired.get(),
            self.released.get(),
            "every acquired element must be released exactly once"
        );
    }
}

/// Signed position resolved the plain way, for the models.
fn model_index(index: isize, len: usize) -> Option<usize> {
    let abs = if index < 0 { len as isize + index } else { index };
    (0..len as isize).contains(&abs).then_some(abs as usize)
}

fn model_result<T>(found: Option<T>) -> Result<T> {
    found.ok_or(SeqError::NotFound)
}

// =============================================================================
// List against Vec
// =============================================================================

#[derive(Clone, Debug, Arbitrary)]
enum ListOp {
    #[proptest(weight = 3)]
    Append(u16),
    #[proptest(weight = 2)]
    Prepend(u16),
    Before(#[proptest(strategy = "-12isize..12")] isize, u16),
    After(#[proptest(strategy = "-12isize..12")] isize, u16),
    Replace(#[proptest(strategy = "-12isize..12")] isize, u16),
    Set(#[proptest(strategy = "-12isize..12")] isize, u16),
    #[proptest(weight = 3)]
    Remove(#[proptest(strategy = "-12isize..12")] isize),
    Get(#[proptest(strategy = "-12isize..12")] isize),
}

fn list_ops() -> impl Strategy<Value = Vec<ListOp>> {
    prop::collection::vec(any::<ListOp>(), 0..=400)
}

// =============================================================================
// Map against BTreeMap
// =============================================================================

#[derive(Clone, Debug, Arbitrary)]
enum MapOp {
    #[proptest(weight = 4)]
    Insert(#[proptest(strategy = "0u16..96")] u16),
    #[proptest(weight = 2)]
    Remove(#[proptest(strategy = "0u16..96")] u16),
    RemoveRank(#[proptest(strategy = "-40isize..40")] isize),
    Get(#[proptest(strategy = "0u16..96")] u16),
    GetRank(#[proptest(strategy = "-40isize..40")] isize),
}

fn map_ops() -> impl Strategy<Value = Vec<MapOp>> {
    prop::collection::vec(any::<MapOp>(), 0..=600)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_list_equivalence(ops in list_ops()) {
        let ledger = Ledger::default();
        let mut seq = Seq::create(ledger.config(Config::new(Variant::List))).unwrap();
        let mut model: Vec<u16> = Vec::new();

        for op in ops {
            match op {
                ListOp::Append(v) => {
                    prop_assert_eq!(seq.append(v), Ok(()));
                    model.push(v);
                }
                ListOp::Prepend(v) => {
                    prop_assert_eq!(seq.prepend(v), Ok(()));
                    model.insert(0, v);
                }
                ListOp::Before(i, v) => {
                    let at = model_index(i, model.len());
                    prop_assert_eq!(seq.insert_before(Locator::Index(i), v), model_result(at).map(|_| ()));
                    if let Some(at) = at {
                        model.insert(at, v);
                    }
                }
                ListOp::After(i, v) => {
                    let at = model_index(i, model.len());
                    prop_assert_eq!(seq.insert_after(Locator::Index(i), v), model_result(at).map(|_| ()));
                    if let Some(at) = at {
                        model.insert(at + 1, v);
                    }
                }
                ListOp::Replace(i, v) | ListOp::Set(i, v) => {
                    let at = model_index(i, model.len());
                    let got = if matches!(op, ListOp::Replace(..)) {
                        seq.replace(Locator::Index(i), v)
                    } else {
                        seq.set(Locator::Index(i), v)
                    };
                    prop_assert_eq!(got, model_result(at).map(|_| ()));
                    if let Some(at) = at {
                        model[at] = v;
                    }
                }
                ListOp::Remove(i) => {
                    let at = model_index(i, model.len());
                    prop_assert_eq!(seq.remove(Locator::Index(i)), model_result(at).map(|_| ()));
                    if let Some(at) = at {
                        model.remove(at);
                    }
                }
                ListOp::Get(i) => {
                    let expected = model_result(model_index(i, model.len()).map(|at| &model[at]));
                    prop_assert_eq!(seq.get(Locator::Index(i)), expected);
                }
            }

            prop_assert_eq!(seq.len(), model.len());
        }

        seq.validate();
        let got: Vec<u16> = seq.iter().map(|(_, v)| *v).collect();
        prop_assert_eq!(&got, &model);
        let backwards: Vec<u16> = seq.cursor(Range::reversed(), -1).unwrap().map(|(_, v)| *v).collect();
        prop_assert_eq!(backwards, model.iter().rev().copied().collect::<Vec<_>>());

        drop(seq);
        ledger.assert_balanced();
    }

    #[test]
    fn prop_map_equivalence(ops in map_ops()) {
        let ledger = Ledger::default();
        let mut seq = Seq::create(ledger.config(Config::ordered(Variant::Map))).unwrap();
        let mut model: BTreeMap<u16, ()> = BTreeMap::new();

        for op in ops {
            match op {
                MapOp::Insert(k) => {
                    let expected = if model.insert(k, ()).is_none() {
                        Ok(())
                    } else {
                        Err(SeqError::DuplicateKey)
                    };
                    prop_assert_eq!(seq.insert(k), expected);
                }
                MapOp::Remove(k) => {
                    let expected = model_result(model.remove(&k));
                    prop_assert_eq!(seq.remove(Locator::Key(&k)), expected);
                }
                MapOp::RemoveRank(i) => {
                    let key = model_index(i, model.len()).and_then(|at| model.keys().nth(at).copied());
                    if let Some(key) = key {
                        model.remove(&key);
                    }
                    prop_assert_eq!(seq.remove(Locator::Index(i)), model_result(key).map(|_| ()));
                }
                MapOp::Get(k) => {
                    let expected = model_result(model.get_key_value(&k).map(|(k, _)| k));
                    prop_assert_eq!(seq.get(Locator::Key(&k)), expected);
                }
                MapOp::GetRank(i) => {
                    let expected = model_result(model_index(i, model.len()).and_then(|at| model.keys().nth(at)));
                    prop_assert_eq!(seq.get(Locator::Index(i)), expected);
                }
            }

            prop_assert_eq!(seq.len(), model.len());
        }

        seq.validate();
        let got: Vec<u16> = seq.iter().map(|(_, k)| *k).collect();
        let expected: Vec<u16> = model.keys().copied().collect();
        prop_assert_eq!(got, expected);

        drop(seq);
        ledger.assert_balanced();
    }
}

// =============================================================================
// Exhaustive small cases
// =============================================================================

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

fn map_of(keys: &[u8]) -> Seq<u8> {
    let mut seq = Seq::create(Config::ordered(Variant::Map)).unwrap();
    for &k in keys {
        seq.insert(k).unwrap();
    }
    seq
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<u8> = vec![10, 20, 30, 40, 50, 60, 70];

    for_each_permutation(&keys, |perm| {
        let mut seq = Seq::create(Config::ordered(Variant::Map)).unwrap();
        for k in perm {
            seq.insert(k).unwrap();
            seq.validate();
        }
        let got: Vec<u8> = seq.iter().map(|(_, k)| *k).collect();
        assert_eq!(got, keys);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys: Vec<u8> = vec![1, 2, 3, 4, 5, 6];

    for_each_permutation(&keys, |perm| {
        let mut seq = map_of(&keys);
        let mut model: BTreeMap<u8, ()> = keys.iter().map(|&k| (k, ())).collect();

        for k in perm {
            assert_eq!(seq.remove(Locator::Key(&k)), Ok(()));
            model.remove(&k);
            assert_eq!(seq.len(), model.len());
            seq.validate();
            let got: Vec<u8> = seq.iter().map(|(_, k)| *k).collect();
            assert_eq!(got, model.keys().copied().collect::<Vec<_>>());
        }
        assert!(seq.is_empty());
    });
}

#[test]
fn exhaustive_list_edits_small_sizes() {
    for len in 0..6usize {
        let base: Vec<u32> = (0..len as u32).collect();
        for index in -(len as isize) - 1..=len as isize {
            let at = model_index(index, len);

            for edit in 0..4 {
                let mut seq = Seq::create(Config::new(Variant::List)).unwrap();
                for &v in &base {
                    seq.append(v).unwrap();
                }
                let mut model = base.clone();
                let result = match edit {
                    0 => seq.insert_before(Locator::Index(index), 99),
                    1 => seq.insert_after(Locator::Index(index), 99),
                    2 => seq.replace(Locator::Index(index), 99),
                    _ => seq.remove(Locator::Index(index)),
                };
                assert_eq!(result, model_result(at).map(|_| ()), "len={len} index={index} edit={edit}");
                if let Some(at) = at {
                    match edit {
                        0 => model.insert(at, 99),
                        1 => model.insert(at + 1, 99),
                        2 => model[at] = 99,
                        _ => {
                            model.remove(at);
                        }
                    }
                }

                seq.validate();
                let got: Vec<u32> = seq.iter().map(|(_, v)| *v).collect();
                assert_eq!(got, model, "len={len} index={index} edit={edit}");
                assert_eq!(seq.get(Locator::Index(0)).ok(), model.first());
                assert_eq!(seq.get(Locator::Index(-1)).ok(), model.last());
            }
        }
    }
}
