/*++

Licensed under the Apache-2.0 license.

File Name:

    syscall.rs

Abstract:

    Typed kernel services callable from host threads. Each wrapper packs
    its arguments into a closure, runs it on the kernel context through
    the offload broker and hands the return value back.

--*/

/// Declare offloaded kernel services.
///
/// ```ignore
/// offload_syscalls! {
///     pub fn sc_add(a: i32, b: i32) -> i32 => add_impl;
/// }
/// // sc_add(&broker, 1, 2) runs add_impl(1, 2) on the handler thread.
/// ```
///
/// Every generated function takes the broker as its first argument and
/// blocks until the implementation has run.
#[macro_export]
macro_rules! offload_syscalls {
    ($(
        $(#[$meta:meta])*
        $vis:vis fn $name:ident($($arg:ident: $ty:ty),* $(,)?) -> $ret:ty => $imp:path;
    )*) => {
        $(
            $(#[$meta])*
            $vis fn $name(broker: &$crate::offload::OffloadBroker, $($arg: $ty),*) -> $ret {
                broker.call(move || $imp($($arg),*))
            }
        )*
    };
}

/// Demo service: prints from whichever context it runs on.
pub fn sc_test_impl(a: i32, b: i32) -> i32 {
    println!("hello from main thread a={a} b={b}");
    0
}

offload_syscalls! {
    /// Run [`sc_test_impl`] on the kernel context.
    pub fn sc_test(a: i32, b: i32) -> i32 => sc_test_impl;
}
