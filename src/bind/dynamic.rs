//! Run-time checked binding.
//!
//! For callables and arguments assembled at run time (job tables, command
//! dispatch), where the compiler cannot match parameters to arguments. The
//! check happens in [`DynFn::bind`], before any execution unit exists.

use std::any::{type_name, Any, TypeId};
use std::fmt;

use super::Task;
use crate::errors::BindingError;

type Value = Box<dyn Any + Send>;
type Thunk = Box<dyn FnOnce() -> Value + Send>;
type Binder = Box<dyn FnOnce(Vec<(Value, &'static str)>) -> Result<Thunk, BindingError> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Param {
    id: TypeId,
    name: &'static str,
}

impl Param {
    fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

/// Arguments collected at run time, in call order.
#[derive(Default)]
pub struct DynArgs {
    values: Vec<(Value, &'static str)>,
}

impl DynArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<T: Any + Send>(&mut self, value: T) -> &mut Self {
        self.values.push((Box::new(value), type_name::<T>()));
        self
    }

    pub fn with<T: Any + Send>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn types(&self) -> impl Iterator<Item = (TypeId, &'static str)> + '_ {
        self.values.iter().map(|(value, name)| ((**value).type_id(), *name))
    }
}

impl fmt::Debug for DynArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.iter().map(|(_, name)| name)).finish()
    }
}

/// A type-erased callable that remembers its parameter types.
pub struct DynFn {
    params: Vec<Param>,
    binder: Binder,
}

impl DynFn {
    /// Erase `f`, recording its parameter list.
    pub fn new<F, Args>(f: F) -> Self
    where
        F: IntoDynFn<Args>,
    {
        f.into_dyn()
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Names of the parameter types, in order.
    pub fn param_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.params.iter().map(|p| p.name)
    }

    /// Check `args` against the parameter list and bind them.
    ///
    /// Arity is checked first, then each position's type.
    pub fn bind(self, args: DynArgs) -> Result<DynBound, BindingError> {
        if args.len() != self.params.len() {
            return Err(BindingError::Arity {
                expected: self.params.len(),
                found: args.len(),
            });
        }

        for (index, (param, (id, found))) in self.params.iter().zip(args.types()).enumerate() {
            if param.id != id {
                return Err(BindingError::Type {
                    index,
                    expected: param.name,
                    found,
                });
            }
        }

        let thunk = (self.binder)(args.values)?;
        Ok(DynBound { thunk })
    }
}

impl fmt::Debug for DynFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynFn")
            .field("params", &self.param_types().collect::<Vec<_>>())
            .finish()
    }
}

/// A dynamically bound task. Its output is the callable's return value,
/// boxed; downcast it to the concrete type after joining.
pub struct DynBound {
    thunk: Thunk,
}

impl fmt::Debug for DynBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynBound").finish_non_exhaustive()
    }
}

impl Task for DynBound {
    type Output = Box<dyn Any + Send>;

    fn run(self) -> Self::Output {
        (self.thunk)()
    }
}

/// Callables that can be erased into a [`DynFn`].
pub trait IntoDynFn<Args> {
    fn into_dyn(self) -> DynFn;
}

macro_rules! impl_into_dyn {
    ($($arg:ident),*) => {
        impl<Func, Ret, $($arg,)*> IntoDynFn<($($arg,)*)> for Func
        where
            Func: FnOnce($($arg),*) -> Ret + Send + 'static,
            Ret: Any + Send,
            $($arg: Any + Send,)*
        {
            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_dyn(self) -> DynFn {
                let params = vec![$(Param::of::<$arg>()),*];
                let expected = params.len();

                let binder: Binder = Box::new(move |values: Vec<(Value, &'static str)>| {
                    let found = values.len();
                    let mut values = values.into_iter().enumerate();
                    $(
                        let $arg: $arg = match values.next() {
                            Some((index, (value, found_name))) => match value.downcast::<$arg>() {
                                Ok(value) => *value,
                                Err(_) => {
                                    return Err(BindingError::Type {
                                        index,
                                        expected: type_name::<$arg>(),
                                        found: found_name,
                                    })
                                }
                            },
                            None => return Err(BindingError::Arity { expected, found }),
                        };
                    )*
                    let thunk: Thunk = Box::new(move || Box::new(self($($arg),*)) as Value);
                    Ok(thunk)
                });

                DynFn { params, binder }
            }
        }
    };
}

impl_into_dyn!();
impl_into_dyn!(A0);
impl_into_dyn!(A0, A1);
impl_into_dyn!(A0, A1, A2);
impl_into_dyn!(A0, A1, A2, A3);
impl_into_dyn!(A0, A1, A2, A3, A4);
impl_into_dyn!(A0, A1, A2, A3, A4, A5);
impl_into_dyn!(A0, A1, A2, A3, A4, A5, A6);
impl_into_dyn!(A0, A1, A2, A3, A4, A5, A6, A7);

#[cfg(test)]
mod tests {
    use super::*;

    fn scale(x: f64, by: u32) -> f64 {
        x * f64::from(by)
    }

    #[test]
    fn matching_arguments_bind_and_run() {
        let f = DynFn::new(scale);
        assert_eq!(f.arity(), 2);

        let bound = f.bind(DynArgs::new().with(1.5f64).with(4u32)).expect("bind");
        let out = bound.run().downcast::<f64>().expect("f64 output");
        assert_eq!(*out, 6.0);
    }

    #[test]
    fn too_few_arguments_is_an_arity_error() {
        let err = DynFn::new(scale).bind(DynArgs::new().with(1.0f64)).unwrap_err();
        assert_eq!(err, BindingError::Arity { expected: 2, found: 1 });
    }

    #[test]
    fn too_many_arguments_is_an_arity_error() {
        let err = DynFn::new(|| 1u8)
            .bind(DynArgs::new().with(()))
            .unwrap_err();
        assert_eq!(err, BindingError::Arity { expected: 0, found: 1 });
    }

    #[test]
    fn wrong_type_reports_position_and_names() {
        let err = DynFn::new(scale)
            .bind(DynArgs::new().with(1.0f64).with(4i64))
            .unwrap_err();
        assert_eq!(
            err,
            BindingError::Type {
                index: 1,
                expected: "u32",
                found: "i64",
            }
        );
    }

    #[test]
    fn eight_parameters_bind_like_the_static_binder() {
        let f = DynFn::new(
            |a: u8, b: u16, c: u32, d: u64, e: i8, g: i16, h: i32, i: i64| {
                let unsigned = u64::from(a) + u64::from(b) + u64::from(c) + d;
                let signed = i64::from(e) + i64::from(g) + i64::from(h) + i;
                (unsigned, signed)
            },
        );
        assert_eq!(f.arity(), 8);

        let args = DynArgs::new()
            .with(1u8)
            .with(2u16)
            .with(3u32)
            .with(4u64)
            .with(5i8)
            .with(6i16)
            .with(7i32)
            .with(8i64);
        let out = f.bind(args).expect("bind").run();
        assert_eq!(out.downcast_ref::<(u64, i64)>(), Some(&(10, 26)));
    }

    #[test]
    fn seven_parameters_still_check_types() {
        let f = DynFn::new(|_: u8, _: u8, _: u8, _: u8, _: u8, _: u8, _: bool| ());
        let mut args = DynArgs::new();
        for _ in 0..6 {
            args = args.with(0u8);
        }
        let err = f.bind(args.with(0u8)).unwrap_err();
        assert_eq!(
            err,
            BindingError::Type {
                index: 6,
                expected: "bool",
                found: "u8",
            }
        );
    }

    #[test]
    fn param_types_are_listed_in_order() {
        let f = DynFn::new(|_: String, _: Vec<u8>| ());
        let names: Vec<_> = f.param_types().collect();
        assert_eq!(names, vec![type_name::<String>(), type_name::<Vec<u8>>()]);
    }
}
