mod end_to_end;
mod helpers;
mod tracing_agent;
