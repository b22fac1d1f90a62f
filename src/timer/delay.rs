use crate::link::Link;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// Runs a blocking loop that repeatedly calls [`Link::tick`].
///
/// This is a simple timing loop for use in environments where interrupts are unavailable
/// or undesired. It paces the link with a delay provider implementing
/// `embedded_hal::delay::DelayNs`, waiting one sample period between ticks.
///
/// # Arguments
/// - `link`: The link to drive.
/// - `delay`: A delay provider implementing `DelayNs`, typically from the HAL.
///
/// # Example
/// ```rust,ignore
/// use askwire::{Link, LinkConfig, timer::run_tick_loop};
/// let link = Link::new(tx, rx, None, LinkConfig::default())?;
/// link.start();
/// run_tick_loop(&link, &mut delay);
/// ```
///
/// # Notes
/// - This loop will never return; it is intended for single-purpose polling firmware.
/// - The time spent inside `tick()` adds to every period, so the real bit rate runs slightly
///   slow. The receiver tolerates a few percent of drift.
pub fn run_tick_loop<D, TX, RX, PTT>(link: &Link<TX, RX, PTT>, delay: &mut D) -> !
where
    D: DelayNs,
    TX: OutputPin,
    RX: InputPin,
    PTT: OutputPin,
{
    let period_ns = link.timing().sample_period_ns;
    loop {
        link.tick();
        delay.delay_ns(period_ns);
    }
}

/// Calls [`Link::tick`] `count` times, one sample period apart.
///
/// Useful for firmware that interleaves link work with other tasks, and for
/// driving a link deterministically in tests.
pub fn run_ticks<D, TX, RX, PTT>(link: &Link<TX, RX, PTT>, delay: &mut D, count: u32)
where
    D: DelayNs,
    TX: OutputPin,
    RX: InputPin,
    PTT: OutputPin,
{
    let period_ns = link.timing().sample_period_ns;
    for _ in 0..count {
        link.tick();
        delay.delay_ns(period_ns);
    }
}
