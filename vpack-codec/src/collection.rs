//! Utilities over Array and Object values
//!
//! Predicates take a member and its position and return `true` to continue
//! (or to select the member). Functions producing new values return a sealed
//! [`Builder`] with default options.

use ahash::AHashSet;
use vpack_format::{Result, VPackError};

use crate::builder::Builder;
use crate::slice::Slice;

/// Order in which [`visit_recursive`] reports nested containers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOrder {
    /// Members of a nested container are reported before the container
    PreOrder,
    /// A nested container is reported before its members
    PostOrder,
}

fn expect_array(slice: &Slice<'_>) -> Result<()> {
    if slice.is_array() {
        Ok(())
    } else {
        Err(VPackError::InvalidValueType(
            "Expecting type Array".to_string(),
        ))
    }
}

fn expect_object(slice: &Slice<'_>) -> Result<()> {
    if slice.is_object() {
        Ok(())
    } else {
        Err(VPackError::InvalidValueType(
            "Expecting type Object".to_string(),
        ))
    }
}

/// Keys of an Object in iteration order
pub fn keys(slice: Slice<'_>) -> Result<Vec<String>> {
    expect_object(&slice)?;
    slice
        .object_iter()?
        .map(|member| member.and_then(|(key, _)| key.copy_string()))
        .collect()
}

/// Values of an Object collected into an Array
pub fn values(slice: Slice<'_>) -> Result<Builder> {
    expect_object(&slice)?;
    let mut b = Builder::new();
    b.open_array()?;
    for member in slice.object_iter()? {
        let (_, value) = member?;
        b.add_slice(value)?;
    }
    b.close()?;
    Ok(b)
}

/// Call `f` on every Array member until it returns `false`
pub fn for_each<'a, F>(slice: Slice<'a>, mut f: F) -> Result<()>
where
    F: FnMut(Slice<'a>, u64) -> bool,
{
    expect_array(&slice)?;
    for (index, member) in slice.array_iter()?.enumerate() {
        if !f(member?, index as u64) {
            break;
        }
    }
    Ok(())
}

/// Array of the members for which `f` returns `true`
pub fn filter<'a, F>(slice: Slice<'a>, mut f: F) -> Result<Builder>
where
    F: FnMut(Slice<'a>, u64) -> bool,
{
    expect_array(&slice)?;
    let mut b = Builder::new();
    b.open_array()?;
    for (index, member) in slice.array_iter()?.enumerate() {
        let member = member?;
        if f(member, index as u64) {
            b.add_slice(member)?;
        }
    }
    b.close()?;
    Ok(b)
}

/// First member for which `f` returns `true`, or the None slice
pub fn find<'a, F>(slice: Slice<'a>, mut f: F) -> Result<Slice<'a>>
where
    F: FnMut(Slice<'a>, u64) -> bool,
{
    expect_array(&slice)?;
    for (index, member) in slice.array_iter()?.enumerate() {
        let member = member?;
        if f(member, index as u64) {
            return Ok(member);
        }
    }
    Ok(Slice::none())
}

/// Whether `f` returns `true` for some member
pub fn contains<'a, F>(slice: Slice<'a>, f: F) -> Result<bool>
where
    F: FnMut(Slice<'a>, u64) -> bool,
{
    Ok(!find(slice, f)?.is_none())
}

/// Whether `f` returns `true` for every member; stops at the first `false`
pub fn all<'a, F>(slice: Slice<'a>, mut f: F) -> Result<bool>
where
    F: FnMut(Slice<'a>, u64) -> bool,
{
    expect_array(&slice)?;
    for (index, member) in slice.array_iter()?.enumerate() {
        if !f(member?, index as u64) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Whether `f` returns `true` for any member; stops at the first `true`
pub fn any<'a, F>(slice: Slice<'a>, f: F) -> Result<bool>
where
    F: FnMut(Slice<'a>, u64) -> bool,
{
    contains(slice, f)
}

fn copy_members<K: AsRef<str>>(slice: Slice<'_>, names: &[K], keep: bool) -> Result<Builder> {
    expect_object(&slice)?;
    let names: AHashSet<&str> = names.iter().map(AsRef::as_ref).collect();
    let mut b = Builder::new();
    b.open_object()?;
    for member in slice.object_iter()? {
        let (key, value) = member?;
        let key = key.get_str()?;
        if names.contains(key) == keep {
            b.add_key(key)?;
            b.add_slice(value)?;
        }
    }
    b.close()?;
    Ok(b)
}

/// Object with only the members named in `names`
pub fn keep<K: AsRef<str>>(slice: Slice<'_>, names: &[K]) -> Result<Builder> {
    copy_members(slice, names, true)
}

/// Object without the members named in `names`
pub fn remove<K: AsRef<str>>(slice: Slice<'_>, names: &[K]) -> Result<Builder> {
    copy_members(slice, names, false)
}

/// Combine two Objects; values from `right` win
///
/// With `merge_values`, members that are Objects on both sides are merged
/// recursively instead of replaced.
pub fn merge(left: Slice<'_>, right: Slice<'_>, merge_values: bool) -> Result<Builder> {
    expect_object(&left)?;
    expect_object(&right)?;
    let mut b = Builder::new();
    merge_into(&mut b, left, right, merge_values)?;
    Ok(b)
}

fn merge_into(b: &mut Builder, left: Slice<'_>, right: Slice<'_>, merge_values: bool) -> Result<()> {
    b.open_object()?;
    let mut overridden = AHashSet::new();
    for member in left.object_iter()? {
        let (key, value) = member?;
        let key = key.get_str()?;
        let replacement = right.get(key)?;
        b.add_key(key)?;
        if replacement.is_none() {
            b.add_slice(value)?;
            continue;
        }
        overridden.insert(key);
        if merge_values && value.is_object() && replacement.is_object() {
            merge_into(b, value, replacement, merge_values)?;
        } else {
            b.add_slice(replacement)?;
        }
    }
    for member in right.object_iter()? {
        let (key, value) = member?;
        let key = key.get_str()?;
        if !overridden.contains(key) {
            b.add_key(key)?;
            b.add_slice(value)?;
        }
    }
    b.close()
}

/// Walk every value nested in an Array or Object
///
/// `f` receives the member's key (the None slice inside Arrays) and its
/// value. Returning `false` stops the whole walk.
pub fn visit_recursive<'a, F>(slice: Slice<'a>, order: VisitOrder, mut f: F) -> Result<()>
where
    F: FnMut(Slice<'a>, Slice<'a>) -> bool,
{
    if !slice.is_array() && !slice.is_object() {
        return Err(VPackError::InvalidValueType(
            "Expecting type Array or Object".to_string(),
        ));
    }
    visit(slice, order, &mut f)?;
    Ok(())
}

/// Returns `false` once the walk was stopped
fn visit<'a, F>(slice: Slice<'a>, order: VisitOrder, f: &mut F) -> Result<bool>
where
    F: FnMut(Slice<'a>, Slice<'a>) -> bool,
{
    if slice.is_array() {
        for member in slice.array_iter()? {
            if !visit_member(Slice::none(), member?, order, f)? {
                return Ok(false);
            }
        }
    } else {
        for member in slice.object_iter()? {
            let (key, value) = member?;
            if !visit_member(key, value, order, f)? {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

fn visit_member<'a, F>(key: Slice<'a>, value: Slice<'a>, order: VisitOrder, f: &mut F) -> Result<bool>
where
    F: FnMut(Slice<'a>, Slice<'a>) -> bool,
{
    let nested = value.is_array() || value.is_object();
    if nested && order == VisitOrder::PreOrder && !visit(value, order, f)? {
        return Ok(false);
    }
    if !f(key, value) {
        return Ok(false);
    }
    if nested && order == VisitOrder::PostOrder {
        return visit(value, order, f);
    }
    Ok(true)
}
