//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                 |
//! |----------------|--------------------|-----------------------------|
//! | `hardware`     | CharacterDisplay   | HD44780 (or any display)    |
//! |                | SensorConversion   | ADC1 alcohol sensor         |
//! |                | IndicatorOutput    | Headlight GPIO              |
//! |                | TimerControl       | esp_timer / host simulation |
//! | `log_sink`     | EventSink          | Serial log output           |
//! | `text_display` | CharacterDisplay   | In-memory 2×16 framebuffer  |

pub mod hardware;
pub mod log_sink;
pub mod text_display;
