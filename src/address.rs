use crate::{ClassDescriptor, Conventions, InvalidArgument, Request, Value, VerifyError};

/// Read a string parameter. Absent is `None`; any other value kind is a
/// caller error.
pub(crate) fn string_param<'r>(
    request: &'r Request,
    key: &str,
) -> Result<Option<&'r str>, VerifyError> {
    match request.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(InvalidArgument::NonStringParameter {
            key: key.to_owned(),
        }
        .into()),
    }
}

/// The method that carries the rules of `action`: `action<Name>` when
/// declared, otherwise `render<Name>`.
pub(crate) fn action_method<'c>(
    class: &'c ClassDescriptor,
    conventions: &Conventions,
    action: &str,
) -> Option<&'c str> {
    class
        .find_method(&conventions.action_method(action))
        .or_else(|| class.find_method(&conventions.render_method(action)))
}

pub(crate) fn signal_method<'c>(
    class: &'c ClassDescriptor,
    conventions: &Conventions,
    signal: &str,
) -> Option<&'c str> {
    class.find_method(&conventions.signal_method(signal))
}

/// Reject a signal whose receiver prefix does not name the component that
/// is about to handle it.
pub(crate) fn ensure_receiver(expected: &str, given: &str) -> Result<(), VerifyError> {
    if expected == given {
        Ok(())
    } else {
        Err(InvalidArgument::WrongSignalReceiver {
            expected: expected.to_owned(),
            given: given.to_owned(),
        }
        .into())
    }
}

/// Collapse a hard check into a boolean: denials become `false`, every other
/// error propagates.
pub(crate) fn probe(result: Result<(), VerifyError>) -> Result<bool, VerifyError> {
    match result {
        Ok(()) => Ok(true),
        Err(VerifyError::Denied(_)) => Ok(false),
        Err(err) => Err(err),
    }
}
