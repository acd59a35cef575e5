//! Drawing surfaces fed by the engine
//!
//! Worker 0 hands a [`RenderSink`] the circles to draw once per rendered tick.
//! The engine never depends on how they are drawn; [`SvgFrames`] writes one
//! SVG file per frame.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::simulation::states::NVec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: NVec2,
    pub radius: f64,
}

pub trait RenderSink: Send {
    fn draw(&mut self, tick: u64, circles: &[Circle]) -> io::Result<()>;
}

/// Writes `frame_<tick>.svg` files into a directory
pub struct SvgFrames {
    dir: PathBuf,
    size: f64, // side of the square viewport
    frames: u64,
}

impl SvgFrames {
    /// Create `dir` if needed; the viewport spans [0, size] on both axes
    pub fn new(dir: impl Into<PathBuf>, size: f64) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, size, frames: 0 })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    pub fn render_svg(&self, circles: &[Circle]) -> String {
        let mut svg = String::new();
        // writing into a String cannot fail
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {s} {s}" width="{s}" height="{s}">"#,
            s = self.size
        );
        for c in circles {
            let _ = writeln!(
                svg,
                r#"  <circle cx="{:.3}" cy="{:.3}" r="{:.3}" fill="none" stroke="black"/>"#,
                c.center.x, c.center.y, c.radius
            );
        }
        svg.push_str("</svg>\n");
        svg
    }
}

impl RenderSink for SvgFrames {
    fn draw(&mut self, tick: u64, circles: &[Circle]) -> io::Result<()> {
        let path = self.dir.join(format!("frame_{tick:06}.svg"));
        fs::write(path, self.render_svg(circles))?;
        self.frames += 1;
        Ok(())
    }
}
