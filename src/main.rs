use log::{error, info};
use sdl2::audio::{AudioQueue, AudioSpecDesired};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::{EventPump, VideoSubsystem};
use std::env;
use std::error::Error;
use std::process;
use std::thread;
use std::time::{Duration, Instant};
use vcs2600::{Console, KeyEvent, NTSC_PALETTE};

const ATARI_FPS: f64 = 60.0;
const FRAME_DURATION: Duration = Duration::from_millis(((1.0 / ATARI_FPS) * 1000.0) as u64);

// The visible window of the 228x262 field: 160 color clocks after the
// horizontal blank, 192 lines after vsync and vertical blank.
const FIRST_VISIBLE_COLUMN: usize = 68;
const FIRST_VISIBLE_LINE: usize = 40;
const VISIBLE_WIDTH: usize = 160;
const VISIBLE_HEIGHT: usize = 192;

const HORIZONTAL_SCALING_FACTOR: usize = 4;
const VERTICAL_SCALING_FACTOR: usize = 2;

// Keep at most a handful of frames of audio queued ahead of the device.
const MAX_QUEUED_AUDIO_BYTES: u32 = 8192;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let rom_path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: vcs2600 <rom>");
            process::exit(1);
        }
    };

    let mut console = match vcs2600::init_console(&rom_path) {
        Ok(console) => console,
        Err(e) => {
            error!("{}: {}", rom_path, e);
            process::exit(1);
        }
    };

    info!("Graphics: init");
    let width = (VISIBLE_WIDTH * HORIZONTAL_SCALING_FACTOR) as u32;
    let height = (VISIBLE_HEIGHT * VERTICAL_SCALING_FACTOR) as u32;

    let sdl_context = sdl2::init()?;
    let video_subsystem = sdl_context.video()?;
    let audio_subsystem = sdl_context.audio()?;

    let desired_spec = AudioSpecDesired {
        freq: Some(44_100),
        channels: Some(2),
        samples: Some(512),
    };
    let audio_queue: AudioQueue<u8> = audio_subsystem.open_queue(None, &desired_spec)?;
    info!("  audio device: {} Hz", audio_queue.spec().freq);
    console.set_audio_sample_rate(audio_queue.spec().freq as u32);
    audio_queue.resume();

    let (mut canvas, texture_creator) = create_sdl_window_and_canvas(video_subsystem, width, height)?;
    let mut texture =
        texture_creator.create_texture_streaming(PixelFormatEnum::RGB24, width, height)?;

    canvas.clear();
    canvas.copy(&texture, None, None)?;
    canvas.present();

    let mut event_pump = sdl_context.event_pump()?;
    let mut fps_start = Instant::now();

    loop {
        console.run_frame();

        render_frame(&mut canvas, &mut texture, &console)?;

        // The platform owns the audio thread; backpressure is handled by
        // dropping a block when the queue runs ahead
        let samples = console.drain_audio();
        if audio_queue.size() < MAX_QUEUED_AUDIO_BYTES {
            audio_queue.queue_audio(&samples)?;
        }

        handle_events(&mut console, &mut event_pump);

        if let Some(delay) = FRAME_DURATION.checked_sub(fps_start.elapsed()) {
            thread::sleep(delay);
        }
        fps_start = Instant::now();
    }
}

fn handle_events(console: &mut Console, event_pump: &mut EventPump) {
    for event in event_pump.poll_iter() {
        match event {
            Event::Quit { .. } => process::exit(0),
            Event::KeyDown {
                keycode: Some(key),
                repeat: false,
                ..
            } => match key {
                Keycode::Escape => process::exit(0),

                // Joystick 0
                Keycode::W => console.up(true),
                Keycode::A => console.left(true),
                Keycode::S => console.down(true),
                Keycode::D => console.right(true),
                Keycode::Space => console.joystick_fire(true),

                // Joystick 1
                Keycode::Up => console.joy1_up(true),
                Keycode::Left => console.joy1_left(true),
                Keycode::Down => console.joy1_down(true),
                Keycode::Right => console.joy1_right(true),
                Keycode::RCtrl => console.joy1_fire(true),

                // Console switches
                Keycode::Num1 => console.tv_type(),
                Keycode::Num2 => console.reset(true),
                Keycode::Num3 => console.select(true),
                Keycode::Num4 => console.p0_difficulty(),
                Keycode::Num5 => console.p1_difficulty(),

                _ => {}
            },
            Event::KeyUp {
                keycode: Some(key), ..
            } => match key {
                Keycode::W => console.up(false),
                Keycode::A => console.left(false),
                Keycode::S => console.down(false),
                Keycode::D => console.right(false),
                Keycode::Space => console.joystick_fire(false),

                Keycode::Up => console.joy1_up(false),
                Keycode::Left => console.joy1_left(false),
                Keycode::Down => console.joy1_down(false),
                Keycode::Right => console.joy1_right(false),
                Keycode::RCtrl => console.joy1_fire(false),

                Keycode::Num2 => console.reset(false),
                Keycode::Num3 => console.select(false),

                _ => {}
            },
            _ => {}
        }
    }
}

/// Blit the visible window of the framebuffer, palette applied, scaled 4x
/// horizontally and 2x vertically.
fn render_frame(
    canvas: &mut Canvas<Window>,
    texture: &mut Texture,
    console: &Console,
) -> Result<(), Box<dyn Error>> {
    let frame = console.frame();

    texture.with_lock(None, |buffer: &mut [u8], pitch: usize| {
        for y in 0..VISIBLE_HEIGHT {
            let line = &frame[FIRST_VISIBLE_LINE + y];
            for x in 0..VISIBLE_WIDTH {
                let color = NTSC_PALETTE[line[FIRST_VISIBLE_COLUMN + x] as usize];

                for row_offset in (0..VERTICAL_SCALING_FACTOR).map(|i| i * pitch) {
                    for col_offset in (0..HORIZONTAL_SCALING_FACTOR).map(|i| i * 3) {
                        let offset = VERTICAL_SCALING_FACTOR * (y * pitch)
                            + HORIZONTAL_SCALING_FACTOR * (x * 3)
                            + row_offset
                            + col_offset;
                        buffer[offset..offset + 3].copy_from_slice(&color.0[0..3]);
                    }
                }
            }
        }
    })?;

    canvas.clear();
    canvas.copy(texture, None, None).map_err(|e| e.to_string())?;
    canvas.present();

    Ok(())
}

fn create_sdl_window_and_canvas(
    video_subsystem: VideoSubsystem,
    width: u32,
    height: u32,
) -> Result<(Canvas<Window>, TextureCreator<WindowContext>), Box<dyn Error>> {
    info!("  video driver: {}", video_subsystem.current_video_driver());

    let window = video_subsystem
        .window("vcs2600", width, height)
        .position_centered()
        .build()?;

    let canvas = window.into_canvas().target_texture().build()?;

    info!("  canvas driver: {}", canvas.info().name);

    let texture_creator = canvas.texture_creator();

    Ok((canvas, texture_creator))
}
