//! ESP32-S3 board adapter.
//!
//! The only module that touches real peripherals. Implements
//! [`GpioPort`] with raw GPIO and ADC1 oneshot calls, [`BusPort`] over
//! UART1 in RS-485 half-duplex mode, and [`SerialPort`] over the UART0
//! console.

use embedded_hal::digital::PinState;
use esp_idf_svc::sys::*;
use log::{info, warn};

use crate::app::ports::{BusError, BusFrame, BusPort, GpioPort, MAX_FRAME, PinMode, SerialPort};
use crate::error::Error;
use crate::pins;
use crate::protocol::Crc8;
use crate::transport::{FrameDecoder, encode_frame};

const HOST_UART: uart_port_t = 0;
const BUS_UART: uart_port_t = 1;
/// Driver ring buffers; must exceed the 128 byte hardware FIFO.
const UART_RX_BUFFER: i32 = 256;
const UART_TX_BUFFER: i32 = 256;
/// `UART_PIN_NO_CHANGE`.
const NO_PIN: i32 = -1;

pub struct BoardAdapter {
    adc: adc_oneshot_unit_handle_t,
    crc: Crc8,
    decoder: FrameDecoder,
    /// Bus id written into the frame header; also used to drop our own echo.
    sender: u8,
}

impl BoardAdapter {
    /// Bring up ADC1 and both UARTs. Call once, before the main loop.
    pub fn new(crc: Crc8, sender: u8) -> Result<Self, Error> {
        // SAFETY: single-threaded init path, runs once from main().
        let adc = unsafe { init_adc()? };
        unsafe {
            init_uart(HOST_UART, pins::HOST_BAUD, NO_PIN, NO_PIN, NO_PIN)?;
            init_uart(
                BUS_UART,
                pins::BUS_BAUD,
                pins::BUS_TX_GPIO,
                pins::BUS_RX_GPIO,
                pins::BUS_DE_GPIO,
            )?;
            if uart_set_mode(BUS_UART, uart_mode_t_UART_MODE_RS485_HALF_DUPLEX) != ESP_OK as i32 {
                return Err(Error::Init("bus UART RS-485 mode"));
            }
        }
        info!("board: ADC1, host UART0 and bus UART1 ready");
        Ok(Self {
            adc,
            decoder: FrameDecoder::new(crc),
            crc,
            sender,
        })
    }

    /// Follow the id the node was assigned during discovery.
    pub fn set_sender(&mut self, id: u8) {
        self.sender = id;
    }
}

unsafe fn init_adc() -> Result<adc_oneshot_unit_handle_t, Error> {
    let mut handle: adc_oneshot_unit_handle_t = core::ptr::null_mut();
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut handle) };
    if ret != ESP_OK as i32 {
        return Err(Error::Init("ADC1 unit"));
    }

    // 10-bit samples match the default adc_full_scale of 1023.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_10,
    };
    let ret = unsafe { adc_oneshot_config_channel(handle, pins::POT_ADC_CHANNEL, &chan_cfg) };
    if ret != ESP_OK as i32 {
        return Err(Error::Init("ADC1 channel"));
    }
    Ok(handle)
}

unsafe fn init_uart(port: uart_port_t, baud: u32, tx: i32, rx: i32, rts: i32) -> Result<(), Error> {
    let cfg = uart_config_t {
        baud_rate: baud as i32,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };
    let ret = unsafe {
        uart_driver_install(port, UART_RX_BUFFER, UART_TX_BUFFER, 0, core::ptr::null_mut(), 0)
    };
    if ret != ESP_OK as i32 {
        return Err(Error::Init("UART driver install"));
    }
    if unsafe { uart_param_config(port, &cfg) } != ESP_OK as i32 {
        return Err(Error::Init("UART params"));
    }
    if unsafe { uart_set_pin(port, tx, rx, rts, NO_PIN) } != ESP_OK as i32 {
        return Err(Error::Init("UART pins"));
    }
    Ok(())
}

// ── GpioPort ──────────────────────────────────────────────────

impl GpioPort for BoardAdapter {
    fn configure_pin(&mut self, pin: i32, mode: PinMode) {
        // Direction lines are wired-AND with the neighbour, so outputs are
        // open-drain and never fight a line held low from the other side.
        let gpio_mode = match mode {
            PinMode::InputPullUp => gpio_mode_t_GPIO_MODE_INPUT,
            PinMode::Output => gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD,
            // Channel configured in init_adc().
            PinMode::Analog => return,
        };
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            ..Default::default()
        };
        // SAFETY: main-loop only; pin numbers come from crate::pins.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            warn!("gpio_config({pin}) failed (rc={ret})");
        }
    }

    fn read_digital(&mut self, pin: i32) -> PinState {
        // SAFETY: register read.
        PinState::from((unsafe { gpio_get_level(pin) }) != 0)
    }

    fn write_digital(&mut self, pin: i32, level: PinState) {
        // SAFETY: pin configured as output by configure_pin().
        unsafe {
            gpio_set_level(pin, u32::from(level == PinState::High));
        }
    }

    fn read_analog(&mut self, pin: i32) -> u16 {
        if pin != pins::POT_ADC_GPIO {
            return 0;
        }
        let mut raw: i32 = 0;
        // SAFETY: handle created in init_adc(); main-loop access only.
        let ret = unsafe { adc_oneshot_read(self.adc, pins::POT_ADC_CHANNEL, &mut raw) };
        if ret != ESP_OK as i32 {
            return 0;
        }
        raw.max(0) as u16
    }
}

// ── BusPort ───────────────────────────────────────────────────

impl BusPort for BoardAdapter {
    fn send(&mut self, dest: u8, bytes: &[u8]) -> Result<(), BusError> {
        if bytes.len() > MAX_FRAME {
            return Err(BusError::TooLong);
        }
        let wire = encode_frame(&self.crc, self.sender, dest, bytes).ok_or(BusError::TooLong)?;
        // SAFETY: driver installed in new(); the transceiver DE line is
        // toggled by the UART in RS-485 half-duplex mode.
        let written = unsafe { uart_write_bytes(BUS_UART, wire.as_ptr().cast(), wire.len()) };
        if written < 0 || written as usize != wire.len() {
            return Err(BusError::IoError);
        }
        Ok(())
    }

    fn receive(&mut self) -> Option<BusFrame> {
        let mut byte = 0u8;
        loop {
            // SAFETY: driver installed in new(); zero ticks never blocks.
            let n = unsafe { uart_read_bytes(BUS_UART, (&raw mut byte).cast(), 1, 0) };
            if n <= 0 {
                return None;
            }
            if let Some(frame) = self.decoder.push(byte) {
                if frame.sender != self.sender {
                    return Some(frame);
                }
            }
        }
    }
}

// ── SerialPort ────────────────────────────────────────────────

impl SerialPort for BoardAdapter {
    fn write_line(&mut self, line: &str) {
        // SAFETY: driver installed in new().
        let written = unsafe { uart_write_bytes(HOST_UART, line.as_ptr().cast(), line.len()) };
        if written < 0 {
            warn!("host UART write failed");
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        // SAFETY: driver installed in new(); zero ticks never blocks.
        let n = unsafe { uart_read_bytes(HOST_UART, buf.as_mut_ptr().cast(), buf.len() as u32, 0) };
        n.max(0) as usize
    }
}
