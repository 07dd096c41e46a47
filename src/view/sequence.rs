//! Sequence View
//!
//! Array-like operations over a sequence node. Queries read the live tree
//! and return plain data or child views. Transforms are pure functions from
//! the current sequence to the next one and are listed in `SEQUENCE_OPS`;
//! the typed wrappers on `SequenceView` route them through the store.

use crate::action::{Arg, AsyncArg, Comparator};
use crate::error::StoreError;
use crate::protocol::{
    clamp_relative, int_arg, value_arg, OpKind, Operation, OperationTable, Property, ResultBag,
};
use crate::schema::PropKind;
use crate::tree::update::{parse_length, resized};
use crate::tree::{Key, Node};
use crate::view::{Outcome, Unpacked, View};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Mutating operations of sequence views.
pub static SEQUENCE_OPS: OperationTable = OperationTable {
    kind: "sequence",
    operations: &[
        Operation { name: "fill", kind: OpKind::Transform(fill), auto_resolve: true },
        Operation { name: "copyWithin", kind: OpKind::Transform(copy_within), auto_resolve: false },
        Operation { name: "push", kind: OpKind::Transform(push), auto_resolve: true },
        Operation { name: "unshift", kind: OpKind::Transform(unshift), auto_resolve: true },
        Operation { name: "pop", kind: OpKind::Transform(pop), auto_resolve: false },
        Operation { name: "shift", kind: OpKind::Transform(shift), auto_resolve: false },
        Operation { name: "splice", kind: OpKind::Transform(splice), auto_resolve: true },
        Operation { name: "sort", kind: OpKind::Transform(sort), auto_resolve: false },
        Operation { name: "reverse", kind: OpKind::Transform(reverse), auto_resolve: false },
    ],
    properties: &[Property { name: "length", set: set_length }],
};

fn seq_items<'a>(state: &'a Node, operation: &str) -> Result<&'a Arc<Vec<Node>>, StoreError> {
    state.as_seq().ok_or_else(|| {
        StoreError::InvalidOperation(format!("{} expects a sequence, got {}", operation, state))
    })
}

fn value_args(args: &[Arg], from: usize) -> Result<Vec<Node>, StoreError> {
    (from..args.len()).map(|ix| value_arg(args, ix)).collect()
}

fn reject_tuple(view: &View, operation: &str) -> Result<(), StoreError> {
    match view.schema().fixed_arity() {
        Some(arity) => Err(StoreError::StructuralViolation(format!(
            "Tuples cannot be extended: {} on a tuple of {} at \"{}\"",
            operation,
            arity,
            view.view_path()
        ))),
        None => Ok(()),
    }
}

/// Element leaving the sequence: plain unless the slot is reference-kinded.
fn removed_element(view: &Rc<View>, index: usize, element: &Node) -> Unpacked {
    match view.schema().prop_kind(index) {
        PropKind::Reference => view.get(&Key::Index(index)),
        PropKind::Value => Unpacked::Value(element.clone()),
    }
}

fn fill(view: &Rc<View>, state: &Node, args: &[Arg], _bag: &mut ResultBag) -> Result<Node, StoreError> {
    let items = seq_items(state, "fill")?;
    let len = items.len();
    let value = value_arg(args, 0)?;
    let start = int_arg(args, 1, "start")?.map_or(0, |n| clamp_relative(n, len));
    let end = int_arg(args, 2, "end")?.map_or(len, |n| clamp_relative(n, len));
    if start >= end {
        return Ok(state.clone());
    }

    let mut next = items.as_ref().clone();
    let mut changed = false;
    for (ix, slot) in next.iter_mut().enumerate().take(end).skip(start) {
        let packed = view.schema().pack_prop(ix, value.clone());
        if !slot.same(&packed) {
            *slot = packed;
            changed = true;
        }
    }
    Ok(if changed { Node::from(next) } else { state.clone() })
}

fn copy_within(_view: &Rc<View>, state: &Node, args: &[Arg], _bag: &mut ResultBag) -> Result<Node, StoreError> {
    let items = seq_items(state, "copyWithin")?;
    let len = items.len();
    let target = int_arg(args, 0, "target")?.map_or(0, |n| clamp_relative(n, len));
    let start = int_arg(args, 1, "start")?.map_or(0, |n| clamp_relative(n, len));
    let end = int_arg(args, 2, "end")?.map_or(len, |n| clamp_relative(n, len));
    let count = end.saturating_sub(start).min(len - target);
    if count == 0 {
        return Ok(state.clone());
    }

    let source: Vec<Node> = items[start..start + count].to_vec();
    let mut next = items.as_ref().clone();
    let mut changed = false;
    for (offset, element) in source.into_iter().enumerate() {
        let slot = &mut next[target + offset];
        if !slot.same(&element) {
            *slot = element;
            changed = true;
        }
    }
    Ok(if changed { Node::from(next) } else { state.clone() })
}

fn push(view: &Rc<View>, state: &Node, args: &[Arg], bag: &mut ResultBag) -> Result<Node, StoreError> {
    let items = seq_items(state, "push")?;
    reject_tuple(view, "push")?;
    let values = value_args(args, 0)?;
    if values.is_empty() {
        bag.set(Node::from(items.len()));
        return Ok(state.clone());
    }

    let mut next = items.as_ref().clone();
    let start = next.len();
    next.extend(
        values
            .into_iter()
            .enumerate()
            .map(|(offset, value)| view.schema().pack_prop(start + offset, value)),
    );
    bag.set(Node::from(next.len()));
    Ok(Node::from(next))
}

fn unshift(view: &Rc<View>, state: &Node, args: &[Arg], bag: &mut ResultBag) -> Result<Node, StoreError> {
    let items = seq_items(state, "unshift")?;
    reject_tuple(view, "unshift")?;
    let values = value_args(args, 0)?;
    if values.is_empty() {
        bag.set(Node::from(items.len()));
        return Ok(state.clone());
    }

    let mut next: Vec<Node> = values
        .into_iter()
        .enumerate()
        .map(|(ix, value)| view.schema().pack_prop(ix, value))
        .collect();
    next.extend(items.iter().cloned());
    bag.set(Node::from(next.len()));
    Ok(Node::from(next))
}

fn pop(view: &Rc<View>, state: &Node, _args: &[Arg], bag: &mut ResultBag) -> Result<Node, StoreError> {
    let items = seq_items(state, "pop")?;
    let Some((last, rest)) = items.split_last() else {
        bag.set(Node::UNDEFINED);
        return Ok(state.clone());
    };
    bag.set(removed_element(view, rest.len(), last));
    Ok(Node::from(rest.to_vec()))
}

fn shift(view: &Rc<View>, state: &Node, _args: &[Arg], bag: &mut ResultBag) -> Result<Node, StoreError> {
    let items = seq_items(state, "shift")?;
    let Some((first, rest)) = items.split_first() else {
        bag.set(Node::UNDEFINED);
        return Ok(state.clone());
    };
    bag.set(removed_element(view, 0, first));
    Ok(Node::from(rest.to_vec()))
}

/// `[start, delete_count, ...items]`. A lone `start` deletes to the end.
fn splice(view: &Rc<View>, state: &Node, args: &[Arg], bag: &mut ResultBag) -> Result<Node, StoreError> {
    let items = seq_items(state, "splice")?;
    let len = items.len();
    let start = int_arg(args, 0, "start")?.map_or(0, |n| clamp_relative(n, len));
    let delete_count = match args.len() {
        0 => 0,
        1 => len - start,
        _ => int_arg(args, 1, "deleteCount")?
            .unwrap_or(0)
            .clamp(0, (len - start) as i64) as usize,
    };
    let inserts = value_args(args, 2)?;

    if let Some(arity) = view.schema().fixed_arity() {
        if inserts.len() != delete_count || start + delete_count > arity {
            return Err(StoreError::StructuralViolation(format!(
                "Tuples cannot change length: splice removes {} and inserts {} at {} on a tuple of {}",
                delete_count,
                inserts.len(),
                start,
                arity
            )));
        }
    }

    let removed: Vec<Node> = items[start..start + delete_count].to_vec();
    bag.set(Node::from(removed));
    if delete_count == 0 && inserts.is_empty() {
        return Ok(state.clone());
    }

    let mut next: Vec<Node> = Vec::with_capacity(len - delete_count + inserts.len());
    next.extend(items[..start].iter().cloned());
    next.extend(
        inserts
            .into_iter()
            .enumerate()
            .map(|(offset, value)| view.schema().pack_prop(start + offset, value)),
    );
    next.extend(items[start + delete_count..].iter().cloned());
    Ok(Node::from(next))
}

/// String order by UTF-16 code units.
fn default_compare(a: &Node, b: &Node) -> Ordering {
    a.to_js_string()
        .encode_utf16()
        .cmp(b.to_js_string().encode_utf16())
}

/// Stable index sort. `Undefined` elements always go last and never reach
/// the comparator.
fn sort(_view: &Rc<View>, state: &Node, args: &[Arg], _bag: &mut ResultBag) -> Result<Node, StoreError> {
    let items = seq_items(state, "sort")?;
    let compare: Option<Comparator> = match args.first() {
        None => None,
        Some(Arg::Compare(compare)) => Some(compare.clone()),
        Some(Arg::Value(value)) if value.is_undefined() => None,
        Some(Arg::Value(value)) => {
            return Err(StoreError::InvalidArgument(format!(
                "The comparison function must be either a function or undefined, got {}",
                value
            )))
        }
    };

    let (mut order, undefined): (Vec<usize>, Vec<usize>) =
        (0..items.len()).partition(|&ix| !items[ix].is_undefined());
    match &compare {
        Some(compare) => order.sort_by(|&a, &b| compare(&items[a], &items[b])),
        None => order.sort_by(|&a, &b| default_compare(&items[a], &items[b])),
    }
    order.extend(undefined);

    if order.iter().enumerate().all(|(pos, &ix)| pos == ix) {
        return Ok(state.clone());
    }
    Ok(Node::seq(order.into_iter().map(|ix| items[ix].clone())))
}

fn reverse(_view: &Rc<View>, state: &Node, _args: &[Arg], _bag: &mut ResultBag) -> Result<Node, StoreError> {
    let items = seq_items(state, "reverse")?;
    if items.len() < 2 {
        return Ok(state.clone());
    }
    Ok(Node::seq(items.iter().rev().cloned()))
}

/// `length` assignment: truncate, or extend with the default rest element.
fn set_length(view: &Rc<View>, value: Node) -> Result<Outcome, StoreError> {
    if let Some(arity) = view.schema().fixed_arity() {
        return Err(StoreError::StructuralViolation(format!(
            "Tuples cannot change length: tuple of {} at \"{}\"",
            arity,
            view.view_path()
        )));
    }
    let length = parse_length(&value)?;

    let store = view.store()?;
    let current = store.get(view.tree_path());
    let items = seq_items(&current, "length")?;
    if items.len() == length {
        return Ok(Outcome::Nothing);
    }

    let next = resized(items, length, view.schema().default_rest_prop())?;
    store.put(view.tree_path(), Node::from(next))?;
    Ok(Outcome::Nothing)
}

/// Array-like view over a sequence node.
#[derive(Debug, Clone)]
pub struct SequenceView {
    view: Rc<View>,
}

impl SequenceView {
    pub(crate) fn new(view: Rc<View>) -> Self {
        Self { view }
    }

    pub fn view(&self) -> &Rc<View> {
        &self.view
    }

    fn snapshot(&self) -> Arc<Vec<Node>> {
        self.view.value().as_seq().cloned().unwrap_or_default()
    }

    /// Element at `index`: a view for typed containers, the plain value otherwise.
    pub fn get(&self, index: usize) -> Unpacked {
        self.view.get(&Key::Index(index))
    }

    /// Number of elements. Records a read of `<path>.length` while reads
    /// are being tracked.
    pub fn len(&self) -> usize {
        if let Ok(store) = self.view.store() {
            store.record_read(self.view.tree_path().child("length"));
        }
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn items(&self) -> Vec<Unpacked> {
        (0..self.snapshot().len()).map(|ix| self.get(ix)).collect()
    }

    pub fn to_node(&self) -> Node {
        self.view.value()
    }

    /// New plain sequence with `others` appended; sequence arguments are
    /// flattened one level.
    pub fn concat(&self, others: &[Node]) -> Node {
        let mut out = self.snapshot().as_ref().clone();
        for other in others {
            match other.as_seq() {
                Some(items) => out.extend(items.iter().cloned()),
                None => out.push(other.clone()),
            }
        }
        Node::from(out)
    }

    pub fn index_of(&self, search: &Node, from: Option<i64>) -> Option<usize> {
        let items = self.snapshot();
        let start = from.map_or(0, |n| clamp_relative(n, items.len()));
        items
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, item)| item.strict_eq(search))
            .map(|(ix, _)| ix)
    }

    pub fn last_index_of(&self, search: &Node, from: Option<i64>) -> Option<usize> {
        let items = self.snapshot();
        let len = items.len() as i64;
        let from = match from {
            None => len - 1,
            Some(n) if n < 0 => len + n,
            Some(n) => n.min(len - 1),
        };
        if from < 0 {
            return None;
        }
        (0..=from as usize).rev().find(|&ix| items[ix].strict_eq(search))
    }

    /// Membership test that also finds `NaN`.
    pub fn includes(&self, search: &Node) -> bool {
        let items = self.snapshot();
        if search.is_nan() {
            items.iter().any(Node::is_nan)
        } else {
            items.iter().any(|item| item.strict_eq(search))
        }
    }

    pub fn for_each(&self, mut f: impl FnMut(Unpacked, usize)) {
        for ix in 0..self.snapshot().len() {
            f(self.get(ix), ix);
        }
    }

    pub fn map<T>(&self, mut f: impl FnMut(Unpacked, usize) -> T) -> Vec<T> {
        (0..self.snapshot().len()).map(|ix| f(self.get(ix), ix)).collect()
    }

    pub fn filter(&self, mut f: impl FnMut(&Unpacked, usize) -> bool) -> Vec<Unpacked> {
        (0..self.snapshot().len())
            .map(|ix| (self.get(ix), ix))
            .filter(|(item, ix)| f(item, *ix))
            .map(|(item, _)| item)
            .collect()
    }

    pub fn find(&self, mut f: impl FnMut(&Unpacked, usize) -> bool) -> Option<Unpacked> {
        (0..self.snapshot().len())
            .map(|ix| (self.get(ix), ix))
            .find(|(item, ix)| f(item, *ix))
            .map(|(item, _)| item)
    }

    pub fn find_index(&self, mut f: impl FnMut(&Unpacked, usize) -> bool) -> Option<usize> {
        (0..self.snapshot().len()).find(|&ix| f(&self.get(ix), ix))
    }

    pub fn some(&self, mut f: impl FnMut(&Unpacked, usize) -> bool) -> bool {
        (0..self.snapshot().len()).any(|ix| f(&self.get(ix), ix))
    }

    pub fn every(&self, mut f: impl FnMut(&Unpacked, usize) -> bool) -> bool {
        (0..self.snapshot().len()).all(|ix| f(&self.get(ix), ix))
    }

    /// Left fold. Without a seed the first element is the initial
    /// accumulator, and an empty sequence is an error.
    pub fn reduce(
        &self,
        f: impl FnMut(Unpacked, Unpacked, usize) -> Unpacked,
        seed: Option<Unpacked>,
    ) -> Result<Unpacked, StoreError> {
        let order: Vec<usize> = (0..self.snapshot().len()).collect();
        self.fold(order, f, seed)
    }

    pub fn reduce_right(
        &self,
        f: impl FnMut(Unpacked, Unpacked, usize) -> Unpacked,
        seed: Option<Unpacked>,
    ) -> Result<Unpacked, StoreError> {
        let order: Vec<usize> = (0..self.snapshot().len()).rev().collect();
        self.fold(order, f, seed)
    }

    fn fold(
        &self,
        order: Vec<usize>,
        mut f: impl FnMut(Unpacked, Unpacked, usize) -> Unpacked,
        seed: Option<Unpacked>,
    ) -> Result<Unpacked, StoreError> {
        let mut order = order.into_iter();
        let mut acc = match seed {
            Some(seed) => seed,
            None => match order.next() {
                Some(ix) => self.get(ix),
                None => {
                    return Err(StoreError::InvalidOperation(
                        "Reduce of empty sequence with no initial value".to_string(),
                    ))
                }
            },
        };
        for ix in order {
            acc = f(acc, self.get(ix), ix);
        }
        Ok(acc)
    }

    /// Plain copy of `[start, end)`; negative positions count from the end.
    pub fn slice(&self, start: Option<i64>, end: Option<i64>) -> Node {
        let items = self.snapshot();
        let len = items.len();
        let start = start.map_or(0, |n| clamp_relative(n, len));
        let end = end.map_or(len, |n| clamp_relative(n, len));
        if start >= end {
            return Node::seq(Vec::<Node>::new());
        }
        Node::from(items[start..end].to_vec())
    }

    /// Undefined and null elements render as empty strings.
    pub fn join(&self, separator: Option<&str>) -> String {
        self.snapshot()
            .iter()
            .map(|item| match item {
                item if item.is_undefined() || *item == Node::NULL => String::new(),
                item => item.to_js_string(),
            })
            .collect::<Vec<_>>()
            .join(separator.unwrap_or(","))
    }

    pub fn to_js_string(&self) -> String {
        self.join(None)
    }

    pub fn push<I, T>(&self, items: I) -> Result<Outcome, StoreError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Node>,
    {
        self.view.call("push", items.into_iter().map(AsyncArg::value).collect())
    }

    /// Push values that may still be pending; resolved leftmost first.
    pub async fn push_async(&self, items: Vec<AsyncArg>) -> Result<Outcome, StoreError> {
        self.view.call_async("push", items).await
    }

    pub fn unshift<I, T>(&self, items: I) -> Result<Outcome, StoreError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Node>,
    {
        self.view.call("unshift", items.into_iter().map(AsyncArg::value).collect())
    }

    pub fn pop(&self) -> Result<Outcome, StoreError> {
        self.view.call("pop", Vec::new())
    }

    pub fn shift(&self) -> Result<Outcome, StoreError> {
        self.view.call("shift", Vec::new())
    }

    /// Remove `delete_count` elements at `start` (to the end when `None`)
    /// and insert `items` in their place. The outcome holds the removed
    /// elements.
    pub fn splice<I, T>(&self, start: i64, delete_count: Option<usize>, items: I) -> Result<Outcome, StoreError>
    where
        I: IntoIterator<Item = T>,
        T: Into<Node>,
    {
        let mut args = vec![AsyncArg::value(start)];
        let inserts: Vec<AsyncArg> = items.into_iter().map(AsyncArg::value).collect();
        match delete_count {
            Some(count) => args.push(AsyncArg::value(count)),
            None if inserts.is_empty() => {}
            None => {
                let len = self.snapshot().len();
                args.push(AsyncArg::value(len - clamp_relative(start, len)));
            }
        }
        args.extend(inserts);
        self.view.call("splice", args)
    }

    pub fn sort(&self) -> Result<Outcome, StoreError> {
        self.view.call("sort", Vec::new())
    }

    pub fn sort_by(&self, compare: impl Fn(&Node, &Node) -> Ordering + 'static) -> Result<Outcome, StoreError> {
        self.view.call("sort", vec![Arg::compare(compare).into()])
    }

    pub fn reverse(&self) -> Result<Outcome, StoreError> {
        self.view.call("reverse", Vec::new())
    }

    pub fn fill(&self, value: impl Into<Node>, start: Option<i64>, end: Option<i64>) -> Result<Outcome, StoreError> {
        let mut args = vec![AsyncArg::value(value)];
        args.push(AsyncArg::value(start.map_or(Node::UNDEFINED, Node::from)));
        args.push(AsyncArg::value(end.map_or(Node::UNDEFINED, Node::from)));
        self.view.call("fill", args)
    }

    pub fn copy_within(&self, target: i64, start: Option<i64>, end: Option<i64>) -> Result<Outcome, StoreError> {
        let args = vec![
            AsyncArg::value(target),
            AsyncArg::value(start.map_or(Node::UNDEFINED, Node::from)),
            AsyncArg::value(end.map_or(Node::UNDEFINED, Node::from)),
        ];
        self.view.call("copyWithin", args)
    }

    /// Assign `length`.
    pub fn set_len(&self, length: usize) -> Result<Outcome, StoreError> {
        self.view.set(&Key::from("length"), Node::from(length))
    }
}

impl fmt::Display for SequenceView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_js_string())
    }
}
