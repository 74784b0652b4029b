mod test_denied_capture_holds_nothing;
mod test_mute_and_stop;
