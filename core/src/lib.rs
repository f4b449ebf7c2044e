pub mod audio;
pub mod config;
pub mod instrument;
pub mod midi;
pub mod pcm;
pub mod render;
pub mod scheduler;
pub mod time;
