//! Capture a sample sweep around a commit and render the compressed trace.
//!
//! Runs on the simulated bus, so it works anywhere:
//!
//! ```sh
//! cargo run --example capture_trace
//! ```

use nv2a_chip::kelvin;
use nv2a_fifo::{trace, FifoChannel, Pushbuffer, SampleBuffer, SimBus};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut chan = FifoChannel::new(SimBus::new());
    let mut pb = Pushbuffer::new(0x0010_0000, 4096);
    chan.reset(&mut pb);

    let mut p = pb.begin();
    p = pb.push_method(p, 0, kelvin::SET_COLOR_CLEAR_VALUE, &[0xFF00_00FF])?;
    p = pb.push_method(
        p,
        0,
        kelvin::CLEAR_SURFACE,
        &[kelvin::clear_surface::COLOR | kelvin::clear_surface::Z],
    )?;
    pb.end(p);

    let mut samples = SampleBuffer::new(512);

    println!("Before commit:");
    chan.fill_samples(&mut samples);
    trace::render(samples.as_slice(), &mut std::io::stdout())?;

    chan.commit(&pb, p);

    println!("After commit:");
    chan.fill_samples(&mut samples);
    trace::render(samples.as_slice(), &mut std::io::stdout())?;

    Ok(())
}
