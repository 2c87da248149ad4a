// Spawns the compiled binary inside a pseudo terminal and plays one full
// word-quota test through it: raw mode, the alternate screen, the results
// screen and the exit path all run for real.
//
// Needs a PTY, so it is unix-only and ignored by default. Run it with:
// cargo test --test pty_session -- --ignored

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn full_run_through_a_pseudo_terminal() -> Result<(), Box<dyn std::error::Error>> {
    let bin = assert_cmd::cargo::cargo_bin("typometer");
    let mut p = spawn(format!("{} -w 10 --no-save", bin.display()))?;

    // Let the alternate screen come up before typing.
    std::thread::sleep(Duration::from_millis(200));

    // Ten whitespace separated tokens end a ten word test no matter what
    // text was generated.
    p.send("a a a a a a a a a a")?;
    std::thread::sleep(Duration::from_millis(200));

    // Esc on the results screen quits.
    p.send("\x1b")?;
    p.expect(Eof)?;
    Ok(())
}
