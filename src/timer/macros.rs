/// Declares a static global `ASK_LINK` protected by a `critical_section` mutex.
///
/// This macro creates a `static` singleton `ASK_LINK` suitable for use in
/// interrupt-based environments, where both the main thread and an ISR need
/// to reach the same link.
///
/// # Arguments
/// - `$tx`: The concrete type of the TX pin (must implement `OutputPin`)
/// - `$rx`: The concrete type of the RX pin (must implement `InputPin`)
/// - `$ptt`: The concrete type of the PTT pin (must implement `OutputPin`)
///
/// # Example
/// ```rust,ignore
/// init_link!(MyTxPinType, MyRxPinType, MyPttPinType);
///
/// fn main() {
///     let link = Link::new(tx, rx, None, LinkConfig::default()).unwrap();
///     link.start();
///     askwire::timer::global_link_setup(&ASK_LINK, link);
/// }
/// ```
#[macro_export]
macro_rules! init_link {
    ( $tx:ty, $rx:ty, $ptt:ty ) => {
        pub static ASK_LINK: $crate::critical_section::Mutex<
            core::cell::RefCell<Option<$crate::link::Link<$tx, $rx, $ptt>>>,
        > = $crate::critical_section::Mutex::new(core::cell::RefCell::new(None));
    };
}

/// Calls [`Link::tick`](crate::link::Link::tick) on the global `ASK_LINK` if it has been
/// installed.
///
/// This macro is intended to be invoked from a timer ISR running at eight times the bit rate.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIM2() {
///     tick_link!();
/// }
/// ```
///
/// # Notes
/// - This macro assumes `ASK_LINK` was declared with `init_link!`.
/// - Safe to call before setup; it does nothing until a link is installed.
#[macro_export]
macro_rules! tick_link {
    () => {
        $crate::critical_section::with(|cs| {
            if let Some(link) = ASK_LINK.borrow(cs).borrow().as_ref() {
                link.tick();
            }
        })
    };
}

/// Calls [`Link::tx_tick`](crate::link::Link::tx_tick) on the global `ASK_LINK` from a
/// bit-rate interrupt.
#[macro_export]
macro_rules! tick_link_tx {
    () => {
        $crate::critical_section::with(|cs| {
            if let Some(link) = ASK_LINK.borrow(cs).borrow().as_ref() {
                link.tx_tick();
            }
        })
    };
}

/// Calls [`Link::rx_tick`](crate::link::Link::rx_tick) on the global `ASK_LINK` from a
/// sampling interrupt.
#[macro_export]
macro_rules! tick_link_rx {
    () => {
        $crate::critical_section::with(|cs| {
            if let Some(link) = ASK_LINK.borrow(cs).borrow().as_ref() {
                link.rx_tick();
            }
        })
    };
}
