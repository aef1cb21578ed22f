//! Binding a method to an explicitly chosen receiver.
//!
//! [`bind_member`] takes methods that need `&mut self`; [`bind_member_ref`]
//! takes methods that only read through `&self`, which also lets a receiver
//! be borrowed or shared without a lock.

use super::capture::{Mut, Owned, Ref, Shared};
use super::Task;

/// How a bound method reaches its receiver.
///
/// The three implementations correspond to the three receiver modes:
/// - [`Owned`]: the task owns an independent copy
/// - [`Mut`]: the task borrows the caller's value (scoped launches only)
/// - [`Shared`] around a `spin::Mutex`: every holder sees the mutations; the
///   lock is held for the duration of the call
pub trait Receiver: Send {
    type Target: ?Sized;

    fn with<O>(self, f: impl FnOnce(&mut Self::Target) -> O) -> O;
}

impl<T: Send> Receiver for Owned<T> {
    type Target = T;

    fn with<O>(mut self, f: impl FnOnce(&mut T) -> O) -> O {
        f(&mut self.0)
    }
}

impl<'a, T: ?Sized + Send> Receiver for Mut<'a, T> {
    type Target = T;

    fn with<O>(self, f: impl FnOnce(&mut T) -> O) -> O {
        f(self.into_inner())
    }
}

impl<T: ?Sized + Send> Receiver for Shared<spin::Mutex<T>> {
    type Target = T;

    fn with<O>(self, f: impl FnOnce(&mut T) -> O) -> O {
        let mut guard = self.lock();
        f(&mut guard)
    }
}

/// How a bound `&self` method reaches its receiver.
///
/// - [`Owned`]: the task owns an independent copy
/// - [`Ref`]: the task borrows the caller's value (scoped launches only)
/// - [`Mut`]: an exclusive borrow, read through a shared reference
/// - [`Shared`]: shared ownership; any mutation goes through the target's
///   own interior mutability
pub trait ReceiverRef: Send {
    type Target: ?Sized;

    fn with_ref<O>(self, f: impl FnOnce(&Self::Target) -> O) -> O;
}

impl<T: Send> ReceiverRef for Owned<T> {
    type Target = T;

    fn with_ref<O>(self, f: impl FnOnce(&T) -> O) -> O {
        f(&self.0)
    }
}

impl<'a, T: ?Sized + Sync> ReceiverRef for Ref<'a, T> {
    type Target = T;

    fn with_ref<O>(self, f: impl FnOnce(&T) -> O) -> O {
        f(self.get())
    }
}

impl<'a, T: ?Sized + Send> ReceiverRef for Mut<'a, T> {
    type Target = T;

    fn with_ref<O>(self, f: impl FnOnce(&T) -> O) -> O {
        f(&*self.into_inner())
    }
}

impl<T: ?Sized + Send + Sync> ReceiverRef for Shared<T> {
    type Target = T;

    fn with_ref<O>(self, f: impl FnOnce(&T) -> O) -> O {
        f(&*self)
    }
}

/// Methods of `Recv` that accept the argument tuple `Args`.
///
/// Implemented for every `FnOnce(&mut Recv, ..)` of up to eight further
/// parameters, which includes method paths such as `Counter::add`.
pub trait InvokeMember<Recv: ?Sized, Args>: Send {
    type Output: Send;

    fn invoke_on(self, receiver: &mut Recv, args: Args) -> Self::Output;
}

/// A method bound to a receiver and its arguments.
#[must_use = "a bound task does nothing until it is launched or run"]
pub struct BoundMember<M, R, A> {
    method: M,
    receiver: R,
    args: A,
}

/// Bind `method` to `receiver` and the argument tuple `args`.
///
/// ```
/// use bound_threads::bind::{bind_member, Owned, Task};
///
/// struct Counter(u32);
/// impl Counter {
///     fn add(&mut self, n: u32) -> u32 {
///         self.0 += n;
///         self.0
///     }
/// }
///
/// let counter = Counter(1);
/// assert_eq!(bind_member(Counter::add, Owned(counter), (2,)).run(), 3);
/// ```
pub fn bind_member<M, R, A>(method: M, receiver: R, args: A) -> BoundMember<M, R, A>
where
    R: Receiver,
    M: InvokeMember<R::Target, A>,
    A: Send,
{
    BoundMember {
        method,
        receiver,
        args,
    }
}

impl<M, R, A> Task for BoundMember<M, R, A>
where
    R: Receiver,
    M: InvokeMember<R::Target, A>,
    A: Send,
{
    type Output = M::Output;

    fn run(self) -> Self::Output {
        let BoundMember {
            method,
            receiver,
            args,
        } = self;
        receiver.with(move |target| method.invoke_on(target, args))
    }
}

/// Read-only methods of `Recv` that accept the argument tuple `Args`.
///
/// Implemented for every `FnOnce(&Recv, ..)` of up to eight further
/// parameters, which includes method paths such as `Counter::get`.
pub trait InvokeMemberRef<Recv: ?Sized, Args>: Send {
    type Output: Send;

    fn invoke_on_ref(self, receiver: &Recv, args: Args) -> Self::Output;
}

/// A `&self` method bound to a receiver and its arguments.
#[must_use = "a bound task does nothing until it is launched or run"]
pub struct BoundMemberRef<M, R, A> {
    method: M,
    receiver: R,
    args: A,
}

/// Bind the `&self` method `method` to `receiver` and the argument tuple
/// `args`.
///
/// ```
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// use bound_threads::bind::{bind_member_ref, shared, Task};
///
/// struct Hits(AtomicU32);
/// impl Hits {
///     fn record(&self, n: u32) -> u32 {
///         self.0.fetch_add(n, Ordering::SeqCst) + n
///     }
/// }
///
/// let hits = Arc::new(Hits(AtomicU32::new(0)));
/// assert_eq!(bind_member_ref(Hits::record, shared(&hits), (4,)).run(), 4);
/// assert_eq!(hits.0.load(Ordering::SeqCst), 4);
/// ```
pub fn bind_member_ref<M, R, A>(method: M, receiver: R, args: A) -> BoundMemberRef<M, R, A>
where
    R: ReceiverRef,
    M: InvokeMemberRef<R::Target, A>,
    A: Send,
{
    BoundMemberRef {
        method,
        receiver,
        args,
    }
}

impl<M, R, A> Task for BoundMemberRef<M, R, A>
where
    R: ReceiverRef,
    M: InvokeMemberRef<R::Target, A>,
    A: Send,
{
    type Output = M::Output;

    fn run(self) -> Self::Output {
        let BoundMemberRef {
            method,
            receiver,
            args,
        } = self;
        receiver.with_ref(move |target| method.invoke_on_ref(target, args))
    }
}

macro_rules! impl_invoke_member {
    ($($arg:ident),*) => {
        impl<Func, Recv, Ret, $($arg,)*> InvokeMember<Recv, ($($arg,)*)> for Func
        where
            Recv: ?Sized,
            Func: FnOnce(&mut Recv, $($arg),*) -> Ret + Send,
            Ret: Send,
        {
            type Output = Ret;

            #[allow(non_snake_case)]
            fn invoke_on(self, receiver: &mut Recv, ($($arg,)*): ($($arg,)*)) -> Ret {
                self(receiver, $($arg),*)
            }
        }
    };
}

impl_invoke_member!();
impl_invoke_member!(A0);
impl_invoke_member!(A0, A1);
impl_invoke_member!(A0, A1, A2);
impl_invoke_member!(A0, A1, A2, A3);
impl_invoke_member!(A0, A1, A2, A3, A4);
impl_invoke_member!(A0, A1, A2, A3, A4, A5);
impl_invoke_member!(A0, A1, A2, A3, A4, A5, A6);
impl_invoke_member!(A0, A1, A2, A3, A4, A5, A6, A7);

macro_rules! impl_invoke_member_ref {
    ($($arg:ident),*) => {
        impl<Func, Recv, Ret, $($arg,)*> InvokeMemberRef<Recv, ($($arg,)*)> for Func
        where
            Recv: ?Sized,
            Func: FnOnce(&Recv, $($arg),*) -> Ret + Send,
            Ret: Send,
        {
            type Output = Ret;

            #[allow(non_snake_case)]
            fn invoke_on_ref(self, receiver: &Recv, ($($arg,)*): ($($arg,)*)) -> Ret {
                self(receiver, $($arg),*)
            }
        }
    };
}

impl_invoke_member_ref!();
impl_invoke_member_ref!(A0);
impl_invoke_member_ref!(A0, A1);
impl_invoke_member_ref!(A0, A1, A2);
impl_invoke_member_ref!(A0, A1, A2, A3);
impl_invoke_member_ref!(A0, A1, A2, A3, A4);
impl_invoke_member_ref!(A0, A1, A2, A3, A4, A5);
impl_invoke_member_ref!(A0, A1, A2, A3, A4, A5, A6);
impl_invoke_member_ref!(A0, A1, A2, A3, A4, A5, A6, A7);

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::bind::{by_mut, by_ref, copied, shared};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Account {
        balance: i64,
        history: Vec<i64>,
    }

    impl Account {
        fn deposit(&mut self, amount: i64) -> i64 {
            self.balance += amount;
            self.history.push(amount);
            self.balance
        }

        fn transfer(&mut self, amount: i64, fee: i64) -> i64 {
            self.deposit(-(amount + fee))
        }

        fn projected(&self, extra: i64) -> i64 {
            self.balance + extra
        }
    }

    struct Ledger {
        total: AtomicI64,
    }

    impl Ledger {
        fn post(&self, amount: i64) -> i64 {
            self.total.fetch_add(amount, Ordering::SeqCst) + amount
        }
    }

    #[test]
    fn owned_receiver_mutates_a_copy() {
        let account = Account::default();
        let out = bind_member(Account::deposit, Owned(copied(&account)), (50,)).run();
        assert_eq!(out, 50);
        assert_eq!(account, Account::default());
    }

    #[test]
    fn borrowed_receiver_mutates_caller_value() {
        let mut account = Account::default();
        let out = bind_member(Account::transfer, by_mut(&mut account), (10, 1)).run();
        assert_eq!(out, -11);
        assert_eq!(account.history, vec![-11]);
    }

    #[test]
    fn shared_receiver_mutations_visible_to_every_holder() {
        let account = Arc::new(spin::Mutex::new(Account::default()));
        bind_member(Account::deposit, shared(&account), (5,)).run();
        bind_member(Account::deposit, shared(&account), (7,)).run();
        assert_eq!(account.lock().balance, 12);
        assert_eq!(Arc::strong_count(&account), 1);
    }

    #[test]
    fn closure_methods_work_too() {
        let out = bind_member(
            |a: &mut Account| a.history.len(),
            Owned(Account::default()),
            (),
        )
        .run();
        assert_eq!(out, 0);
    }

    #[test]
    fn read_only_method_on_owned_receiver() {
        let account = Account {
            balance: 40,
            history: vec![40],
        };
        let out = bind_member_ref(Account::projected, Owned(account), (2,)).run();
        assert_eq!(out, 42);
    }

    #[test]
    fn read_only_method_on_borrowed_receiver() {
        let account = Account {
            balance: 10,
            history: Vec::new(),
        };
        let a = bind_member_ref(Account::projected, by_ref(&account), (1,)).run();
        let b = bind_member_ref(Account::projected, by_ref(&account), (5,)).run();
        assert_eq!((a, b), (11, 15));
        assert_eq!(account.balance, 10);
    }

    #[test]
    fn read_only_method_on_shared_receiver_without_a_lock() {
        let ledger = Arc::new(Ledger {
            total: AtomicI64::new(0),
        });
        bind_member_ref(Ledger::post, shared(&ledger), (5,)).run();
        let last = bind_member_ref(Ledger::post, shared(&ledger), (7,)).run();
        assert_eq!(last, 12);
        assert_eq!(ledger.total.load(Ordering::SeqCst), 12);
        assert_eq!(Arc::strong_count(&ledger), 1);
    }

    #[test]
    fn read_only_method_through_exclusive_borrow() {
        let mut account = Account::default();
        let out = bind_member_ref(Account::projected, by_mut(&mut account), (3,)).run();
        assert_eq!(out, 3);
    }
}
