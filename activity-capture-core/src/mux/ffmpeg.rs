use std::collections::VecDeque;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;

use image::imageops::{self, FilterType};
use log::{debug, info};

use crate::models::config::EncoderSettings;
use crate::models::error::CaptureError;
use crate::models::frame::Frame;
use crate::traits::muxer::Muxer;

/// Lines of ffmpeg stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Encodes the frame sequence by piping raw `rgb24` frames into an `ffmpeg`
/// child process, optionally muxing the WAV sink as the audio track.
///
/// Frames are spaced uniformly at the configured frame rate. Audio is
/// attached as-is; its length is not reconciled with the video.
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    settings: EncoderSettings,
}

impl FfmpegMuxer {
    pub fn new(settings: EncoderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    /// Command-line arguments for one encode.
    pub fn build_args(&self, width: u32, height: u32, fps: f64, audio: Option<&Path>, output: &Path) -> Vec<OsString> {
        let s = &self.settings;
        let mut args: Vec<OsString> = Vec::with_capacity(24);

        extend(&mut args, &["-y", "-f", "rawvideo", "-pix_fmt", "rgb24"]);
        extend(&mut args, &["-s", format!("{}x{}", width, height).as_str()]);
        extend(&mut args, &["-framerate", fps.to_string().as_str()]);
        extend(&mut args, &["-i", "pipe:0"]);

        if let Some(audio) = audio {
            args.push("-i".into());
            args.push(audio.as_os_str().to_owned());
        }

        extend(
            &mut args,
            &[
                "-c:v",
                s.video_codec.as_str(),
                "-crf",
                s.crf.as_str(),
                "-preset",
                s.preset.as_str(),
                "-pix_fmt",
                "yuv420p",
            ],
        );
        if audio.is_some() {
            extend(&mut args, &["-c:a", s.audio_codec.as_str()]);
        }

        args.push(output.as_os_str().to_owned());
        args
    }

    fn spawn(&self, args: &[OsString]) -> Result<Child, CaptureError> {
        Command::new(&self.settings.ffmpeg_path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CaptureError::EncodeFailure(format!("failed to spawn {}: {}", self.settings.ffmpeg_path, e)))
    }

    /// Stream every frame to ffmpeg's stdin, resizing any frame whose size
    /// differs from the first. Closing stdin signals end of input.
    fn write_frames(child: &mut Child, frames: &[Frame], size: (u32, u32)) -> Result<(), CaptureError> {
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CaptureError::EncodeFailure("ffmpeg stdin not available".into()))?;
        let mut writer = BufWriter::new(stdin);

        for frame in frames {
            let result = if frame.image.dimensions() == size {
                writer.write_all(frame.image.as_raw())
            } else {
                debug!(
                    "Resizing frame {} from {:?} to {:?}",
                    frame.sequence,
                    frame.image.dimensions(),
                    size
                );
                let resized = imageops::resize(&frame.image, size.0, size.1, FilterType::Triangle);
                writer.write_all(resized.as_raw())
            };
            result.map_err(|e| CaptureError::EncodeFailure(format!("failed to write frame {}: {}", frame.sequence, e)))?;
        }

        writer
            .flush()
            .map_err(|e| CaptureError::EncodeFailure(format!("failed to flush frames: {}", e)))
    }
}

impl Muxer for FfmpegMuxer {
    fn mux(&self, frames: &[Frame], fps: f64, audio: Option<&Path>, output: &Path) -> Result<(), CaptureError> {
        let first = frames
            .first()
            .ok_or_else(|| CaptureError::EncodeFailure("no frames to encode".into()))?;
        let size = first.image.dimensions();

        let args = self.build_args(size.0, size.1, fps, audio, output);
        debug!("Running {} {:?}", self.settings.ffmpeg_path, args);
        let mut child = self.spawn(&args)?;

        let stderr = child.stderr.take();
        let drain = thread::Builder::new().name("ffmpeg-stderr".into()).spawn(move || {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            if let Some(stderr) = stderr {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    debug!("ffmpeg: {}", line);
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }
            Vec::from(tail).join("\n")
        });
        let drain = match drain {
            Ok(handle) => handle,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CaptureError::EncodeFailure(format!("failed to spawn stderr reader: {}", e)));
            }
        };

        let written = Self::write_frames(&mut child, frames, size);
        let status = child
            .wait()
            .map_err(|e| CaptureError::EncodeFailure(format!("failed to wait for ffmpeg: {}", e)))?;
        let tail = drain.join().unwrap_or_default();

        if !status.success() {
            return Err(CaptureError::EncodeFailure(format!("ffmpeg exited with {}:\n{}", status, tail)));
        }
        written?;

        info!(
            "Encoded {} frames at {} fps to {}",
            frames.len(),
            fps,
            output.display()
        );
        Ok(())
    }

    fn codecs(&self) -> (String, String) {
        (self.settings.video_codec.clone(), self.settings.audio_codec.clone())
    }
}

fn extend(args: &mut Vec<OsString>, values: &[&str]) {
    args.extend(values.iter().map(OsString::from));
}

#[cfg(test)]
mod tests {
    use chrono::Local;
    use image::RgbImage;

    use super::*;

    fn as_strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn video_only_args() {
        let muxer = FfmpegMuxer::new(EncoderSettings::default());
        let args = as_strings(&muxer.build_args(852, 480, 0.2, None, Path::new("out.mp4")));

        assert_eq!(
            args,
            vec![
                "-y", "-f", "rawvideo", "-pix_fmt", "rgb24", "-s", "852x480", "-framerate", "0.2", "-i", "pipe:0",
                "-c:v", "libx265", "-crf", "28", "-preset", "medium", "-pix_fmt", "yuv420p", "out.mp4",
            ]
        );
    }

    #[test]
    fn audio_input_and_codec_added() {
        let settings = EncoderSettings {
            video_codec: "libx264".into(),
            crf: "23".into(),
            ..EncoderSettings::default()
        };
        let muxer = FfmpegMuxer::new(settings);
        let args = as_strings(&muxer.build_args(640, 480, 1.0, Some(Path::new("temp_audio.wav")), Path::new("o.mp4")));

        let audio_input = args.iter().position(|a| a == "temp_audio.wav").unwrap();
        assert_eq!(args[audio_input - 1], "-i");
        assert!(audio_input > args.iter().position(|a| a == "pipe:0").unwrap());
        assert!(args.windows(2).any(|w| w == ["-c:a", "aac"]));
        assert!(args.windows(2).any(|w| w == ["-c:v", "libx264"]));
        assert!(args.windows(2).any(|w| w == ["-crf", "23"]));
        assert_eq!(args.last().map(String::as_str), Some("o.mp4"));
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let muxer = FfmpegMuxer::new(EncoderSettings::default());
        let err = muxer.mux(&[], 0.2, None, Path::new("unused.mp4")).unwrap_err();
        assert!(matches!(err, CaptureError::EncodeFailure(_)));
    }

    #[test]
    fn missing_binary_is_an_encode_failure() {
        let muxer = FfmpegMuxer::new(EncoderSettings {
            ffmpeg_path: "/nonexistent/ffmpeg-binary".into(),
            ..EncoderSettings::default()
        });
        let frame = Frame {
            image: RgbImage::new(4, 2),
            captured_at: Local::now(),
            sequence: 0,
        };

        let err = muxer.mux(&[frame], 0.2, None, Path::new("unused.mp4")).unwrap_err();
        assert!(matches!(err, CaptureError::EncodeFailure(msg) if msg.contains("failed to spawn")));
    }
}
