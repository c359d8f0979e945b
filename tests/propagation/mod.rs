mod integrators;
mod stop_condition;
