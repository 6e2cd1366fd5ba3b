//! Per-step state persistence.

use std::convert::Infallible;
use std::io::{self, Write};

use nalgebra::DMatrix;
use serde::Serialize;

/// Borrowed view of the state after a completed step.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub step: usize,
    pub positions: &'a DMatrix<f64>,
    pub velocities: &'a DMatrix<f64>,
    pub mean_pe: f64,
    pub mean_ke: f64,
    pub temperature: f64,
}

impl Frame<'_> {
    pub fn owned(&self) -> OwnedFrame {
        OwnedFrame {
            step: self.step,
            positions: self.positions.clone(),
            velocities: self.velocities.clone(),
            mean_pe: self.mean_pe,
            mean_ke: self.mean_ke,
            temperature: self.temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnedFrame {
    pub step: usize,
    pub positions: DMatrix<f64>,
    pub velocities: DMatrix<f64>,
    pub mean_pe: f64,
    pub mean_ke: f64,
    pub temperature: f64,
}

/// Receives every recorded frame, in step order.
pub trait StateSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn record(&mut self, frame: &Frame<'_>) -> Result<(), Self::Error>;
}

impl<S: StateSink + ?Sized> StateSink for &mut S {
    type Error = S::Error;

    fn record(&mut self, frame: &Frame<'_>) -> Result<(), Self::Error> {
        (**self).record(frame)
    }
}

/// Discards every frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl StateSink for NullSink {
    type Error = Infallible;

    fn record(&mut self, _frame: &Frame<'_>) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Keeps a full copy of every frame.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub frames: Vec<OwnedFrame>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn last(&self) -> Option<&OwnedFrame> {
        self.frames.last()
    }

    /// The recorded trajectory as a YAML list of frames.
    pub fn to_yaml(&self) -> Result<String, serde_yml::Error> {
        serde_yml::to_string(&self.frames)
    }
}

impl StateSink for MemorySink {
    type Error = Infallible;

    fn record(&mut self, frame: &Frame<'_>) -> Result<(), Self::Error> {
        self.frames.push(frame.owned());
        Ok(())
    }
}

/// Writes the scalar observables of every `stride`-th frame as CSV rows.
pub struct CsvSink<W: Write> {
    writer: W,
    stride: usize,
    header_written: bool,
}

impl<W: Write> CsvSink<W> {
    pub const HEADER: &'static str = "step,mean_pe,mean_ke,total_energy,temperature";

    pub fn new(writer: W) -> Self {
        Self::with_stride(writer, 1)
    }

    /// A stride of zero is treated as one.
    pub fn with_stride(writer: W, stride: usize) -> Self {
        CsvSink {
            writer,
            stride: stride.max(1),
            header_written: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> StateSink for CsvSink<W> {
    type Error = io::Error;

    fn record(&mut self, frame: &Frame<'_>) -> Result<(), Self::Error> {
        if !self.header_written {
            writeln!(self.writer, "{}", Self::HEADER)?;
            self.header_written = true;
        }
        if frame.step % self.stride != 0 {
            return Ok(());
        }
        writeln!(
            self.writer,
            "{},{:.10e},{:.10e},{:.10e},{:.10e}",
            frame.step,
            frame.mean_pe,
            frame.mean_ke,
            frame.mean_pe + frame.mean_ke,
            frame.temperature
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_at(step: usize, positions: &DMatrix<f64>) -> Frame<'_> {
        Frame {
            step,
            positions,
            velocities: positions,
            mean_pe: -1.5,
            mean_ke: 0.5,
            temperature: 1.0 / 3.0,
        }
    }

    #[test]
    fn test_memory_sink_dumps_yaml() {
        let positions = DMatrix::from_row_slice(1, 2, &[0.25, 0.75]);
        let mut sink = MemorySink::new();
        sink.record(&frame_at(3, &positions)).unwrap();

        let yaml = sink.to_yaml().unwrap();
        assert!(yaml.contains("step: 3"));
        assert!(yaml.contains("mean_pe: -1.5"));
        assert!(yaml.contains("0.75"));
    }

    #[test]
    fn test_memory_sink_copies_frames() {
        let positions = DMatrix::from_element(2, 2, 1.0);
        let mut sink = MemorySink::new();
        sink.record(&frame_at(0, &positions)).unwrap();
        sink.record(&frame_at(1, &positions)).unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.last().unwrap().step, 1);
        assert_eq!(sink.frames[0].positions, positions);
    }

    #[test]
    fn test_csv_sink_honours_stride() {
        let positions = DMatrix::zeros(1, 2);
        let mut sink = CsvSink::with_stride(Vec::new(), 2);
        for step in 0..5 {
            sink.record(&frame_at(step, &positions)).unwrap();
        }
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], CsvSink::<Vec<u8>>::HEADER);
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("0,"));
        assert!(lines[2].starts_with("2,"));
        assert!(lines[3].starts_with("4,"));

        let fields: Vec<f64> = lines[1]
            .split(',')
            .skip(1)
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(fields[2], -1.0);
    }

    fn record_steps<S: StateSink>(mut sink: S, steps: usize) {
        let positions = DMatrix::zeros(1, 2);
        for step in 0..steps {
            sink.record(&frame_at(step, &positions)).unwrap();
        }
    }

    #[test]
    fn test_sink_through_mutable_reference() {
        let mut inner = MemorySink::new();
        record_steps(&mut inner, 3);
        assert_eq!(inner.len(), 3);
        record_steps(NullSink, 3);
    }
}
