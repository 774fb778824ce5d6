mod batch;
mod config;
mod pipeline;
mod remote;
