//! Packaging a callable and its arguments into one task body.
//!
//! [`bind`] pairs a callable with a tuple of arguments. Each tuple element is
//! handed to the callable as-is, so its type decides how it crosses the
//! thread boundary:
//!
//! | argument                 | transfer                                          |
//! |--------------------------|---------------------------------------------------|
//! | a plain value `x`        | moved; `Copy` types are copied                    |
//! | [`copied(&x)`](copied)   | cloned; the caller keeps `x`                      |
//! | [`take(&mut x)`](take)   | moved out; `x` is left at `Default::default()`    |
//! | [`by_ref(&x)`](by_ref)   | shared reference (scoped launches only)           |
//! | [`by_mut(&mut x)`](by_mut) | exclusive reference (scoped launches only)      |
//! | [`shared(&arc)`](shared) | shared ownership through a reference count        |
//!
//! Nothing aliases caller storage unless one of the reference markers asks
//! for it. A callable whose parameters do not match the tuple is rejected by
//! the compiler:
//!
//! ```compile_fail
//! use bound_threads::bind::bind;
//!
//! // two parameters, one argument
//! let _ = bind(|a: u32, b: u32| a + b, (1u32,));
//! ```
//!
//! A value moved into a task cannot be read again at the call site:
//!
//! ```compile_fail
//! let name = String::from("job");
//! let mut h = bound_threads::start(|s: String| s.len(), (name,)).unwrap();
//! println!("{name}");
//! h.join().unwrap();
//! ```
//!
//! Callables and arguments only known at run time go through
//! [`dynamic::DynFn`], which reports mismatches as
//! [`BindingError`](crate::BindingError) before anything is launched.

mod capture;
pub mod dynamic;
mod member;

pub use capture::{by_mut, by_ref, copied, shared, take, Mut, Owned, Ref, Shared};
pub use member::{
    bind_member, bind_member_ref, BoundMember, BoundMemberRef, InvokeMember, InvokeMemberRef,
    Receiver, ReceiverRef,
};

/// A zero-argument unit of work, run exactly once on its execution unit.
pub trait Task: Send {
    type Output: Send;

    fn run(self) -> Self::Output;
}

/// Callables that accept the argument tuple `Args`.
///
/// Implemented for every `FnOnce` of up to eight parameters whose parameter
/// types match the tuple element types exactly.
pub trait Invoke<Args>: Send {
    type Output: Send;

    fn invoke(self, args: Args) -> Self::Output;
}

/// A callable bound to its arguments, ready to launch.
#[must_use = "a bound task does nothing until it is launched or run"]
pub struct Bound<F, A> {
    f: F,
    args: A,
}

/// Bind `f` to the argument tuple `args`.
pub fn bind<F, A>(f: F, args: A) -> Bound<F, A>
where
    F: Invoke<A>,
    A: Send,
{
    Bound { f, args }
}

impl<F, A> Task for Bound<F, A>
where
    F: Invoke<A>,
    A: Send,
{
    type Output = F::Output;

    fn run(self) -> Self::Output {
        self.f.invoke(self.args)
    }
}

macro_rules! impl_invoke {
    ($($arg:ident),*) => {
        impl<Func, Ret, $($arg,)*> Invoke<($($arg,)*)> for Func
        where
            Func: FnOnce($($arg),*) -> Ret + Send,
            Ret: Send,
        {
            type Output = Ret;

            #[allow(non_snake_case)]
            fn invoke(self, ($($arg,)*): ($($arg,)*)) -> Ret {
                self($($arg),*)
            }
        }
    };
}

impl_invoke!();
impl_invoke!(A0);
impl_invoke!(A0, A1);
impl_invoke!(A0, A1, A2);
impl_invoke!(A0, A1, A2, A3);
impl_invoke!(A0, A1, A2, A3, A4);
impl_invoke!(A0, A1, A2, A3, A4, A5);
impl_invoke!(A0, A1, A2, A3, A4, A5, A6);
impl_invoke!(A0, A1, A2, A3, A4, A5, A6, A7);
