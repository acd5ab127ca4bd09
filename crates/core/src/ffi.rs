//! Raw call contract bridge
//!
//! Converts the `#[repr(C)]` declaration array of [`retrovars_sdk::raw`] into
//! typed [`Variable`]s, and answers raw point queries. Decoding only checks
//! what is needed to read memory safely; the result still goes through the
//! normal declaration validation when accepted.

use std::ffi::{c_char, c_int, c_uint, c_void, CStr};
use std::sync::Arc;

use retrovars_sdk::{
    ChangeNotifyFn, ChangeTiming, RawVariable, RawVariableQuery, VariableId, VariableKind,
};

use crate::error::{VariableError, VariableResult};
use crate::registry::VariableHost;
use crate::variables::{OnChange, ValueDomain, Variable, VariableValue};

/// Opaque core handle passed back to raw callbacks
///
/// SAFETY: The core that supplied the handle guarantees it stays valid, and
/// safe to use from the thread that delivers notifications, for as long as
/// its declarations are active.
#[derive(Clone, Copy)]
struct CoreHandle(*mut c_void);

impl CoreHandle {
    /// Get the inner pointer
    fn get(&self) -> *mut c_void {
        self.0
    }
}

unsafe impl Send for CoreHandle {}
unsafe impl Sync for CoreHandle {}

fn malformed(id: VariableId, reason: impl Into<String>) -> VariableError {
    VariableError::MalformedRaw {
        id,
        reason: reason.into(),
    }
}

/// Read an optional C string; NULL reads as empty
unsafe fn read_str(id: VariableId, field: &str, ptr: *const c_char) -> VariableResult<String> {
    if ptr.is_null() {
        return Ok(String::new());
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(str::to_owned)
        .map_err(|_| malformed(id, format!("{} is not valid UTF-8", field)))
}

/// Read a NULL-terminated array of option labels
unsafe fn read_options(id: VariableId, values: *const c_void) -> VariableResult<Vec<String>> {
    if values.is_null() {
        return Err(malformed(id, "missing option list"));
    }
    let labels = values as *const *const c_char;
    let mut options = Vec::new();
    loop {
        let label = *labels.add(options.len());
        if label.is_null() {
            return Ok(options);
        }
        options.push(read_str(id, "option label", label)?);
    }
}

/// Read `N` elements from a required pointer
unsafe fn read_array<T: Copy, const N: usize>(
    id: VariableId,
    field: &str,
    ptr: *const c_void,
) -> VariableResult<[T; N]> {
    if ptr.is_null() {
        return Err(malformed(id, format!("missing {}", field)));
    }
    Ok(*(ptr as *const [T; N]))
}

unsafe fn decode_variable(
    id: VariableId,
    raw: &RawVariable,
    kind: VariableKind,
    handle: CoreHandle,
) -> VariableResult<Variable> {
    let timing = ChangeTiming::from_raw(raw.change)
        .ok_or_else(|| malformed(id, format!("unknown change timing {}", raw.change)))?;

    let mut variable = Variable {
        kind,
        timing,
        name: read_str(id, "name", raw.name)?,
        display_name: read_str(id, "display name", raw.pub_name)?,
        description: read_str(id, "description", raw.description)?,
        ..Variable::default()
    };

    if kind == VariableKind::Separator {
        if !raw.values.is_null() || !raw.initial.is_null() || raw.change_notify.is_some() {
            return Err(VariableError::UnexpectedPayload { id, kind });
        }
        return Ok(variable);
    }

    if matches!(kind, VariableKind::Bool | VariableKind::Resolution) && !raw.values.is_null() {
        return Err(VariableError::InvalidDomain {
            id,
            reason: format!("{} takes no value domain", kind),
        });
    }

    let (domain, initial) = match kind {
        VariableKind::Enum => {
            let [index] = read_array::<c_uint, 1>(id, "initial index", raw.initial)?;
            (
                ValueDomain::Enum(read_options(id, raw.values)?),
                VariableValue::Enum(index),
            )
        }
        VariableKind::Bool => {
            // Read as a byte: any non-zero value is true
            let [byte] = read_array::<u8, 1>(id, "initial bool", raw.initial)?;
            (ValueDomain::None, VariableValue::Bool(byte != 0))
        }
        VariableKind::Int => {
            let [low, high] = read_array::<c_int, 2>(id, "int range", raw.values)?;
            let [initial] = read_array::<c_int, 1>(id, "initial int", raw.initial)?;
            (ValueDomain::Int { low, high }, VariableValue::Int(initial))
        }
        VariableKind::Float => {
            let [low, high] = read_array::<f32, 2>(id, "float range", raw.values)?;
            let [initial] = read_array::<f32, 1>(id, "initial float", raw.initial)?;
            (ValueDomain::Float { low, high }, VariableValue::Float(initial))
        }
        VariableKind::Resolution => {
            let [width, height] = read_array::<c_uint, 2>(id, "initial resolution", raw.initial)?;
            (ValueDomain::None, VariableValue::Resolution { width, height })
        }
        VariableKind::Terminator | VariableKind::Separator => {
            return Err(VariableError::UnexpectedPayload { id, kind });
        }
    };

    variable.domain = domain;
    variable.initial = Some(initial);
    variable.on_change = raw.change_notify.map(|notify| wrap_notify(notify, handle));
    Ok(variable)
}

/// Adapt a raw callback to a typed one
///
/// The value is copied into a temporary shaped like `initial` and a pointer
/// to it is passed along with the core handle.
fn wrap_notify(notify: ChangeNotifyFn, handle: CoreHandle) -> OnChange {
    Arc::new(move |id: VariableId, value: &VariableValue| {
        // Accessed through get() so the closure captures the Send wrapper
        let core = handle.get();
        unsafe {
            match *value {
                VariableValue::Enum(mut index) => {
                    notify(id, &mut index as *mut c_uint as *mut c_void, core)
                }
                VariableValue::Bool(mut b) => notify(id, &mut b as *mut bool as *mut c_void, core),
                VariableValue::Int(mut v) => notify(id, &mut v as *mut c_int as *mut c_void, core),
                VariableValue::Float(mut v) => notify(id, &mut v as *mut f32 as *mut c_void, core),
                VariableValue::Resolution { width, height } => {
                    let mut pair: [c_uint; 2] = [width, height];
                    notify(id, pair.as_mut_ptr() as *mut c_void, core)
                }
            }
        }
    })
}

/// Decode a raw declared sequence
///
/// Scans until the terminator entry; there is no length field.
///
/// # Safety
/// - `sequence` must point to an array of `RawVariable` that contains a
///   terminator entry
/// - every non-NULL pointer in the entries must be valid for the shape its
///   kind prescribes (see [`retrovars_sdk::raw`])
/// - `core_handle` must satisfy the callback contract of the core's
///   `change_notify` functions for as long as the declaration is active
pub unsafe fn decode_sequence(
    sequence: *const RawVariable,
    core_handle: *mut c_void,
) -> VariableResult<Vec<Variable>> {
    if sequence.is_null() {
        return Err(malformed(0, "null sequence"));
    }

    let handle = CoreHandle(core_handle);
    let mut variables = Vec::new();
    loop {
        let id = variables.len() as VariableId;
        let raw = &*sequence.add(variables.len());
        let kind = VariableKind::from_raw(raw.kind)
            .ok_or_else(|| malformed(id, format!("unknown variable kind {}", raw.kind)))?;

        if kind == VariableKind::Terminator {
            if !raw.values.is_null() || !raw.initial.is_null() || raw.change_notify.is_some() {
                return Err(VariableError::UnexpectedPayload { id, kind });
            }
            tracing::trace!("Decoded {} raw variables", variables.len());
            return Ok(variables);
        }

        variables.push(decode_variable(id, raw, kind, handle)?);
    }
}

/// Answer a raw point query
///
/// Writes the current value of `query.id` into `query.value`.
///
/// # Safety
/// `query.value` must point to writable storage shaped like the variable's
/// `initial` (see [`retrovars_sdk::raw`]).
pub unsafe fn answer_query<H: VariableHost + ?Sized>(
    host: &H,
    query: &mut RawVariableQuery,
) -> VariableResult<()> {
    if query.value.is_null() {
        return Err(malformed(query.id, "null query destination"));
    }

    let value = host.get(query.id)?;
    match value {
        VariableValue::Enum(index) => *(query.value as *mut c_uint) = index,
        VariableValue::Bool(b) => *(query.value as *mut bool) = b,
        VariableValue::Int(v) => *(query.value as *mut c_int) = v,
        VariableValue::Float(v) => *(query.value as *mut f32) = v,
        VariableValue::Resolution { width, height } => {
            *(query.value as *mut [c_uint; 2]) = [width, height];
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Channel;
    use std::ffi::CString;
    use std::ptr;
    use std::sync::atomic::{AtomicI32, Ordering};

    fn raw(kind: VariableKind, name: &CStr, values: *const c_void, initial: *const c_void) -> RawVariable {
        RawVariable {
            kind: kind as c_int,
            change: ChangeTiming::Instant as c_int,
            name: name.as_ptr(),
            pub_name: name.as_ptr(),
            description: ptr::null(),
            values,
            initial,
            change_notify: None,
        }
    }

    unsafe extern "C" fn store_int(_id: c_uint, value: *mut c_void, core_handle: *mut c_void) {
        let target = &*(core_handle as *const AtomicI32);
        target.store(*(value as *const c_int), Ordering::SeqCst);
    }

    #[test]
    fn test_decode_sequence() {
        let colorize = CString::new("gb_colorize").unwrap();
        let palette = CString::new("gb_palette").unwrap();
        let skip = CString::new("frameskip").unwrap();
        let gamma = CString::new("gamma").unwrap();
        let size = CString::new("video_size").unwrap();
        let video = CString::new("Video").unwrap();
        let gray = CString::new("Gray").unwrap();
        let green = CString::new("Green").unwrap();

        let labels: [*const c_char; 3] = [gray.as_ptr(), green.as_ptr(), ptr::null()];
        let palette_initial: c_uint = 1;
        let colorize_initial = true;
        let skip_range: [c_int; 2] = [0, 10];
        let skip_initial: c_int = 5;
        let gamma_range: [f32; 2] = [0.5, 2.5];
        let gamma_initial: f32 = 1.0;
        let size_initial: [c_uint; 2] = [160, 144];

        let mut separator = raw(VariableKind::Separator, &video, ptr::null(), ptr::null());
        separator.name = ptr::null();

        let sequence = [
            separator,
            raw(
                VariableKind::Bool,
                &colorize,
                ptr::null(),
                &colorize_initial as *const bool as *const c_void,
            ),
            raw(
                VariableKind::Enum,
                &palette,
                labels.as_ptr() as *const c_void,
                &palette_initial as *const c_uint as *const c_void,
            ),
            raw(
                VariableKind::Int,
                &skip,
                skip_range.as_ptr() as *const c_void,
                &skip_initial as *const c_int as *const c_void,
            ),
            raw(
                VariableKind::Float,
                &gamma,
                gamma_range.as_ptr() as *const c_void,
                &gamma_initial as *const f32 as *const c_void,
            ),
            raw(
                VariableKind::Resolution,
                &size,
                ptr::null(),
                size_initial.as_ptr() as *const c_void,
            ),
            RawVariable::terminator(),
        ];

        let vars = unsafe { decode_sequence(sequence.as_ptr(), ptr::null_mut()) }.unwrap();
        assert_eq!(vars.len(), 6);
        assert_eq!(vars[0].kind, VariableKind::Separator);
        assert_eq!(vars[0].display_name, "Video");
        assert_eq!(vars[0].name, "");
        assert_eq!(vars[1].initial, Some(VariableValue::Bool(true)));
        assert_eq!(
            vars[2].domain,
            ValueDomain::Enum(vec!["Gray".to_string(), "Green".to_string()])
        );
        assert_eq!(vars[2].initial, Some(VariableValue::Enum(1)));
        assert_eq!(vars[3].domain, ValueDomain::Int { low: 0, high: 10 });
        assert_eq!(vars[4].initial, Some(VariableValue::Float(1.0)));
        assert_eq!(
            vars[5].initial,
            Some(VariableValue::Resolution { width: 160, height: 144 })
        );

        let channel = Channel::new();
        channel.accept(&vars).unwrap();
        assert_eq!(channel.get(3), Ok(VariableValue::Int(5)));
    }

    #[test]
    fn test_decode_rejects_bad_entries() {
        let name = CString::new("x").unwrap();
        let flag = true;

        let bad_kind = [
            RawVariable {
                kind: 42,
                ..RawVariable::terminator()
            },
            RawVariable::terminator(),
        ];
        assert!(matches!(
            unsafe { decode_sequence(bad_kind.as_ptr(), ptr::null_mut()) },
            Err(VariableError::MalformedRaw { id: 0, .. })
        ));

        let separator_payload = [
            raw(
                VariableKind::Separator,
                &name,
                ptr::null(),
                &flag as *const bool as *const c_void,
            ),
            RawVariable::terminator(),
        ];
        assert_eq!(
            unsafe { decode_sequence(separator_payload.as_ptr(), ptr::null_mut()) }.unwrap_err(),
            VariableError::UnexpectedPayload {
                id: 0,
                kind: VariableKind::Separator
            }
        );

        let missing_range = [
            raw(VariableKind::Int, &name, ptr::null(), ptr::null()),
            RawVariable::terminator(),
        ];
        assert!(matches!(
            unsafe { decode_sequence(missing_range.as_ptr(), ptr::null_mut()) },
            Err(VariableError::MalformedRaw { id: 0, .. })
        ));

        assert!(unsafe { decode_sequence(ptr::null(), ptr::null_mut()) }.is_err());
    }

    #[test]
    fn test_raw_callback_receives_value_and_handle() {
        let name = CString::new("level").unwrap();
        let range: [c_int; 2] = [0, 10];
        let initial: c_int = 5;
        let seen = AtomicI32::new(-1);

        let mut entry = raw(
            VariableKind::Int,
            &name,
            range.as_ptr() as *const c_void,
            &initial as *const c_int as *const c_void,
        );
        entry.change_notify = Some(store_int);
        let sequence = [entry, RawVariable::terminator()];

        let vars = unsafe {
            decode_sequence(sequence.as_ptr(), &seen as *const AtomicI32 as *mut c_void)
        }
        .unwrap();

        let channel = Channel::new();
        channel.accept(&vars).unwrap();
        channel.set_value(0, VariableValue::Int(8)).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_answer_query() {
        let channel = Channel::new();
        channel
            .accept(&[
                Variable::separator("Video"),
                Variable::resolution("size", "Size", 320, 240),
                Variable::terminator(),
            ])
            .unwrap();

        let mut out: [c_uint; 2] = [0, 0];
        let mut query = RawVariableQuery {
            id: 1,
            value: out.as_mut_ptr() as *mut c_void,
        };
        unsafe { answer_query(&channel, &mut query) }.unwrap();
        assert_eq!(out, [320, 240]);

        query.id = 0;
        assert_eq!(
            unsafe { answer_query(&channel, &mut query) },
            Err(VariableError::UnknownId(0))
        );

        query.value = ptr::null_mut();
        assert!(unsafe { answer_query(&channel, &mut query) }.is_err());
    }
}
