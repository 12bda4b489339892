//! Argument signatures
//!
//! Every event carries a tuple of positional arguments. The tuple type of the
//! first listener registered for an event becomes that event's [`Signature`];
//! later listeners and emissions are checked against it, arity first and then
//! positional types.
//!
//! Emitting through a typed [`Event`](crate::Event) key lets the caller pass
//! [`Nil`] at any position, which binds that position's `Default` value.

use std::any::{TypeId, type_name};
use std::fmt;

use crate::error::EmitterError;

/// A tuple of positional listener arguments (arity 0 to 8)
///
/// Arguments are cloned once per listener, so every position must be
/// `Clone + Send + Sync + 'static`.
pub trait Args: Clone + Send + Sync + 'static {
    /// Number of positional parameters
    const ARITY: usize;

    /// Type names of each position, in order
    fn param_types() -> Vec<&'static str>;
}

macro_rules! count {
    () => { 0 };
    ($head:ident $($tail:ident)*) => { 1 + count!($($tail)*) };
}

macro_rules! impl_args {
    ($($param:ident),*) => {
        impl<$($param),*> Args for ($($param,)*)
        where
            $($param: Clone + Send + Sync + 'static),*
        {
            const ARITY: usize = count!($($param)*);

            fn param_types() -> Vec<&'static str> {
                vec![$(type_name::<$param>()),*]
            }
        }
    };
}

impl_args!();
impl_args!(A1);
impl_args!(A1, A2);
impl_args!(A1, A2, A3);
impl_args!(A1, A2, A3, A4);
impl_args!(A1, A2, A3, A4, A5);
impl_args!(A1, A2, A3, A4, A5, A6);
impl_args!(A1, A2, A3, A4, A5, A6, A7);
impl_args!(A1, A2, A3, A4, A5, A6, A7, A8);

/// The locked parameter list of an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    type_id: TypeId,
    params: Vec<&'static str>,
}

impl Signature {
    /// Signature of the argument tuple `A`
    pub fn of<A: Args>() -> Self {
        Self {
            type_id: TypeId::of::<A>(),
            params: A::param_types(),
        }
    }

    /// Number of positional parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Type names of each position
    pub fn params(&self) -> &[&'static str] {
        &self.params
    }

    /// Check whether the tuple type `A` is this signature
    pub fn is<A: Args>(&self) -> bool {
        self.type_id == TypeId::of::<A>()
    }

    /// Validate `other` against this (locked) signature for `event`
    pub(crate) fn check(&self, event: &str, other: &Signature) -> Result<(), EmitterError> {
        if self.arity() != other.arity() {
            return Err(EmitterError::ArityMismatch {
                event: event.to_string(),
                expected: self.arity(),
                found: other.arity(),
            });
        }
        if self.type_id != other.type_id {
            return Err(EmitterError::TypeMismatch {
                event: event.to_string(),
                expected: self.to_string(),
                found: other.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.params.join(", "))
    }
}

/// "No value" marker for a positional argument
///
/// Binds the `Default` value of the parameter type at that position, e.g.
/// `None` for an `Option`, `0` for an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nil;

/// A value that can be bound to a parameter of type `T`
pub trait Bind<T> {
    fn bind(self) -> T;
}

impl<T> Bind<T> for T {
    fn bind(self) -> T {
        self
    }
}

impl<T: Default> Bind<T> for Nil {
    fn bind(self) -> T {
        T::default()
    }
}

/// A tuple whose positions each bind to the matching position of `A`
pub trait BindArgs<A: Args> {
    fn bind_args(self) -> A;
}

macro_rules! impl_bind_args {
    ($(($param:ident, $value:ident)),*) => {
        impl<$($param,)* $($value),*> BindArgs<($($param,)*)> for ($($value,)*)
        where
            $($param: Clone + Send + Sync + 'static, $value: Bind<$param>),*
        {
            #[allow(non_snake_case, clippy::unused_unit)]
            fn bind_args(self) -> ($($param,)*) {
                let ($($value,)*) = self;
                ($(<$value as Bind<$param>>::bind($value),)*)
            }
        }
    };
}

impl_bind_args!();
impl_bind_args!((A1, V1));
impl_bind_args!((A1, V1), (A2, V2));
impl_bind_args!((A1, V1), (A2, V2), (A3, V3));
impl_bind_args!((A1, V1), (A2, V2), (A3, V3), (A4, V4));
impl_bind_args!((A1, V1), (A2, V2), (A3, V3), (A4, V4), (A5, V5));
impl_bind_args!((A1, V1), (A2, V2), (A3, V3), (A4, V4), (A5, V5), (A6, V6));
impl_bind_args!((A1, V1), (A2, V2), (A3, V3), (A4, V4), (A5, V5), (A6, V6), (A7, V7));
impl_bind_args!((A1, V1), (A2, V2), (A3, V3), (A4, V4), (A5, V5), (A6, V6), (A7, V7), (A8, V8));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity() {
        assert_eq!(<() as Args>::ARITY, 0);
        assert_eq!(<(i32,) as Args>::ARITY, 1);
        assert_eq!(<(Option<String>, i32, String) as Args>::ARITY, 3);
        assert_eq!(<(u8, u8, u8, u8, u8, u8, u8, u8) as Args>::ARITY, 8);
    }

    #[test]
    fn test_signature_display() {
        let sig = Signature::of::<(i32, bool)>();
        assert_eq!(sig.to_string(), "(i32, bool)");
        assert_eq!(Signature::of::<()>().to_string(), "()");
    }

    #[test]
    fn test_check_same_signature() {
        let sig = Signature::of::<(i32, String)>();
        assert!(sig.check("e", &Signature::of::<(i32, String)>()).is_ok());
        assert!(sig.is::<(i32, String)>());
    }

    #[test]
    fn test_check_arity_before_types() {
        let sig = Signature::of::<(i32, String)>();
        let err = sig.check("e", &Signature::of::<(String,)>()).unwrap_err();
        assert_eq!(
            err,
            EmitterError::ArityMismatch {
                event: "e".to_string(),
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn test_check_positional_types() {
        let sig = Signature::of::<(i32, String)>();
        let err = sig.check("e", &Signature::of::<(String, i32)>()).unwrap_err();
        assert!(matches!(err, EmitterError::TypeMismatch { .. }));
    }

    #[test]
    fn test_nil_binds_default() {
        let bound: (Option<String>, i32, String) = (Nil, 10, "fun".to_string()).bind_args();
        assert_eq!(bound, (None, 10, "fun".to_string()));

        let bound: (Option<String>, i32, String) = (Some("bad".to_string()), Nil, Nil).bind_args();
        assert_eq!(bound, (Some("bad".to_string()), 0, String::new()));
    }
}
