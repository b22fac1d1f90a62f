use crate::link::Link;
use core::cell::RefCell;
use critical_section::Mutex;
use embedded_hal::digital::{InputPin, OutputPin};

/// Storage for a link shared with interrupt handlers.
pub type GlobalLink<TX, RX, PTT> = Mutex<RefCell<Option<Link<TX, RX, PTT>>>>;

/// Used to initialize a global static [`Link`] for use with `critical_section`.
///
/// # Returns
/// * An empty mutex-guarded cell
///
/// # Example
/// ```rust,ignore
/// use askwire::timer::{GlobalLink, global_link_init};
/// use some_hal::{PD1, PD2, PD3};
///
/// static ASK_LINK: GlobalLink<PD1, PD2, PD3> = global_link_init();
/// ```
pub const fn global_link_init<TX: OutputPin, RX: InputPin, PTT: OutputPin>()
-> GlobalLink<TX, RX, PTT> {
    Mutex::new(RefCell::new(None))
}

/// Installs `link` in the global slot, returning the link it replaced.
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     let link = Link::new(tx, rx, None, LinkConfig::default()).unwrap();
///     link.start();
///     global_link_setup(&ASK_LINK, link);
/// }
/// ```
pub fn global_link_setup<TX: OutputPin, RX: InputPin, PTT: OutputPin>(
    global_link: &'static GlobalLink<TX, RX, PTT>,
    link: Link<TX, RX, PTT>,
) -> Option<Link<TX, RX, PTT>> {
    critical_section::with(|cs| global_link.borrow(cs).replace(Some(link)))
}

/// Runs the combined tick at each sampling interrupt (`8 × bit_rate`).
///
/// Does nothing until a link has been installed.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIM2() {
///     global_link_tick(&ASK_LINK);
/// }
/// ```
pub fn global_link_tick<TX: OutputPin, RX: InputPin, PTT: OutputPin>(
    global_link: &'static GlobalLink<TX, RX, PTT>,
) {
    let _ = global_link_with(global_link, Link::tick);
}

/// Runs the transmit tick from a bit-rate interrupt.
pub fn global_link_tx_tick<TX: OutputPin, RX: InputPin, PTT: OutputPin>(
    global_link: &'static GlobalLink<TX, RX, PTT>,
) {
    let _ = global_link_with(global_link, Link::tx_tick);
}

/// Runs the sampling tick from an `8 × bit_rate` interrupt.
pub fn global_link_rx_tick<TX: OutputPin, RX: InputPin, PTT: OutputPin>(
    global_link: &'static GlobalLink<TX, RX, PTT>,
) {
    let _ = global_link_with(global_link, Link::rx_tick);
}

/// Calls `f` with the installed link, if any.
///
/// # Example
/// ```rust,ignore
/// let sent = global_link_with(&ASK_LINK, |link| link.send(b"hello").is_ok());
/// ```
pub fn global_link_with<TX: OutputPin, RX: InputPin, PTT: OutputPin, R>(
    global_link: &'static GlobalLink<TX, RX, PTT>,
    f: impl FnOnce(&Link<TX, RX, PTT>) -> R,
) -> Option<R> {
    critical_section::with(|cs| global_link.borrow(cs).borrow().as_ref().map(f))
}
