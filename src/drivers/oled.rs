//! SSD1306 128x64 OLED over I2C.
//!
//! Buffered graphics mode: each [`Screen`] is drawn into the frame buffer
//! and flushed in one go.  Generic over any `embedded_hal::i2c::I2c`, so the
//! same driver runs on the ESP-IDF I2C master and on a host test bus.

use embedded_graphics::{
    mono_font::{
        MonoFont, MonoTextStyle,
        iso_8859_1::{FONT_5X8, FONT_6X10, FONT_10X20},
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use embedded_hal::i2c::I2c;
use ssd1306::{I2CDisplayInterface, Ssd1306, mode::BufferedGraphicsMode, prelude::*};

use crate::pins;
use crate::ui::{self, Screen};

/// Display-side failure.  Never fatal: the screen is presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OledError {
    Init,
    Bus,
}

impl core::fmt::Display for OledError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Init => write!(f, "SSD1306 init failed"),
            Self::Bus => write!(f, "SSD1306 I2C write failed"),
        }
    }
}

const CENTER_X: i32 = 64;

pub struct OledDisplay<I2C> {
    display: Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>,
}

impl<I2C: I2c> OledDisplay<I2C> {
    /// Initialise the panel.  VEXT must be on and the reset line released.
    pub fn new(i2c: I2C) -> Result<Self, OledError> {
        let interface = I2CDisplayInterface::new_custom_address(i2c, pins::OLED_I2C_ADDR);
        let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        display.init().map_err(|_| OledError::Init)?;
        Ok(Self { display })
    }

    pub fn show(&mut self, screen: &Screen) -> Result<(), OledError> {
        self.display.clear_buffer();
        render(&mut self.display, screen).map_err(|_| OledError::Bus)?;
        self.display.flush().map_err(|_| OledError::Bus)
    }
}

/// Draw `screen` onto any 128x64 monochrome target.
pub fn render<D>(target: &mut D, screen: &Screen) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    match *screen {
        Screen::Banner { cycle } => {
            centered(target, &ui::banner(cycle), &FONT_10X20, 32)?;
        }
        Screen::Status {
            sent,
            reading,
            cycle,
            sleep_secs,
        } => {
            centered(target, ui::status_glyph(sent), &FONT_10X20, 14)?;
            if let Some(reading) = reading {
                centered(target, &ui::battery_line(&reading), &FONT_5X8, 38)?;
            }
            centered(target, &ui::cycle_line(cycle, sleep_secs), &FONT_6X10, 54)?;
        }
    }
    Ok(())
}

fn centered<D>(target: &mut D, text: &str, font: &MonoFont<'_>, y: i32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let character = MonoTextStyle::new(font, BinaryColor::On);
    let layout = TextStyleBuilder::new()
        .alignment(Alignment::Center)
        .baseline(Baseline::Middle)
        .build();
    Text::with_text_style(text, Point::new(CENTER_X, y), character, layout).draw(target)?;
    Ok(())
}
