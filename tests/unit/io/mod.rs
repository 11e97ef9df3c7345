mod cli;
mod image;
mod progress;
